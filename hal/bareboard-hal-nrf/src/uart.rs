//! UART0: legacy (non-EasyDMA) UART used for interrupt-driven transmission

use core::convert::Infallible;

use bareboard_hal::uart::{Parity, UartConfig};
use bareboard_hal::{StaticRef, UartTx};
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
use tock_registers::{register_bitfields, register_structs};

use crate::{clear, trigger, Error, EventRegister, TaskRegister};

register_structs! {
    pub UartRegisters {
        (0x000 => pub tasks_startrx: TaskRegister),
        (0x004 => pub tasks_stoprx: TaskRegister),
        (0x008 => pub tasks_starttx: TaskRegister),
        (0x00C => pub tasks_stoptx: TaskRegister),
        (0x010 => _reserved0),
        (0x01C => pub tasks_suspend: TaskRegister),
        (0x020 => _reserved1),
        (0x100 => pub events_cts: EventRegister),
        (0x104 => pub events_ncts: EventRegister),
        (0x108 => pub events_rxdrdy: EventRegister),
        (0x10C => _reserved2),
        (0x11C => pub events_txdrdy: EventRegister),
        (0x120 => _reserved3),
        (0x124 => pub events_error: EventRegister),
        (0x128 => _reserved4),
        (0x144 => pub events_rxto: EventRegister),
        (0x148 => _reserved5),
        (0x304 => pub intenset: ReadWrite<u32, Inten::Register>),
        (0x308 => pub intenclr: ReadWrite<u32, Inten::Register>),
        (0x30C => _reserved6),
        (0x480 => pub errorsrc: ReadWrite<u32>),
        (0x484 => _reserved7),
        (0x500 => pub enable: ReadWrite<u32, Enable::Register>),
        (0x504 => _reserved8),
        (0x508 => pub pselrts: ReadWrite<u32>),
        (0x50C => pub pseltxd: ReadWrite<u32>),
        (0x510 => pub pselcts: ReadWrite<u32>),
        (0x514 => pub pselrxd: ReadWrite<u32>),
        (0x518 => pub rxd: ReadOnly<u32>),
        (0x51C => pub txd: WriteOnly<u32>),
        (0x520 => _reserved9),
        (0x524 => pub baudrate: ReadWrite<u32>),
        (0x528 => _reserved10),
        (0x56C => pub config: ReadWrite<u32, Config::Register>),
        (0x570 => @END),
    }
}

register_bitfields![u32,
    Inten [
        RXDRDY OFFSET(2) NUMBITS(1) [],
        TXDRDY OFFSET(7) NUMBITS(1) [],
        ERROR OFFSET(9) NUMBITS(1) []
    ],
    Enable [
        ENABLE OFFSET(0) NUMBITS(3) [
            Disabled = 0,
            Enabled = 4
        ]
    ],
    Config [
        HWFC OFFSET(0) NUMBITS(1) [],
        PARITY OFFSET(1) NUMBITS(3) [
            Excluded = 0,
            Included = 7
        ]
    ]
];

#[allow(unsafe_code)]
pub const UART0: StaticRef<UartRegisters> =
    unsafe { StaticRef::new(0x4000_2000 as *const UartRegisters) };

#[allow(unsafe_code)]
unsafe impl bareboard_hal::RegisterBlock for UartRegisters {}

/// `PSEL*` value for an unconnected signal
pub const DISCONNECTED: u32 = 0xFFFF_FFFF;

/// Pin assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartPins {
    pub txd: u8,
    pub rxd: u8,
    pub rts: Option<u8>,
    pub cts: Option<u8>,
}

impl UartPins {
    /// nRF51-DK virtual COM port
    pub const NRF51_DK: Self = Self {
        txd: 9,
        rxd: 11,
        rts: Some(8),
        cts: Some(10),
    };

    /// nRF52-DK virtual COM port
    pub const NRF52_DK: Self = Self {
        txd: 6,
        rxd: 8,
        rts: Some(5),
        cts: Some(7),
    };
}

/// `BAUDRATE` register value for a baud rate
pub fn baudrate_register(baudrate: u32) -> Result<u32, Error> {
    let value = match baudrate {
        1200 => 0x0004_F000,
        2400 => 0x0009_D000,
        4800 => 0x0013_B000,
        9600 => 0x0027_5000,
        14400 => 0x003B_0000,
        19200 => 0x004E_A000,
        28800 => 0x0075_F000,
        38400 => 0x009D_5000,
        57600 => 0x00EB_F000,
        76800 => 0x013A_9000,
        115200 => 0x01D7_E000,
        230400 => 0x03AF_B000,
        250000 => 0x0400_0000,
        460800 => 0x075F_7000,
        921600 => 0x0EBE_D000,
        1_000_000 => 0x1000_0000,
        other => return Err(Error::UnsupportedBaudrate(other)),
    };
    Ok(value)
}

fn psel(pin: Option<u8>) -> u32 {
    pin.map_or(DISCONNECTED, u32::from)
}

/// Route the pins, set baud rate and frame format, enable the UART and the
/// TXDRDY interrupt
///
/// RTS/CTS are only connected when flow control is on.
pub fn configure(uart: &UartRegisters, pins: &UartPins, config: &UartConfig) -> Result<(), Error> {
    let baudrate = baudrate_register(config.baudrate)?;

    uart.enable.write(Enable::ENABLE::Disabled);
    uart.pseltxd.set(pins.txd as u32);
    uart.pselrxd.set(pins.rxd as u32);
    if config.hardware_flow_control {
        uart.pselrts.set(psel(pins.rts));
        uart.pselcts.set(psel(pins.cts));
    } else {
        uart.pselrts.set(DISCONNECTED);
        uart.pselcts.set(DISCONNECTED);
    }

    let parity = match config.parity {
        Parity::None => Config::PARITY::Excluded,
        Parity::Even => Config::PARITY::Included,
    };
    let hwfc = if config.hardware_flow_control {
        Config::HWFC::SET
    } else {
        Config::HWFC::CLEAR
    };
    uart.config.write(hwfc + parity);
    uart.baudrate.set(baudrate);

    clear(&uart.events_txdrdy);
    uart.intenset.write(Inten::TXDRDY::SET);
    uart.enable.write(Enable::ENABLE::Enabled);
    Ok(())
}

/// Interrupt-driven transmitter
///
/// One handle lives in the main loop (`start_tx`), a copy in the UART0
/// interrupt handler (`clear_tx_ready` + `write_byte` / `stop_tx`).
#[derive(Clone, Copy)]
pub struct Uart<'a> {
    regs: &'a UartRegisters,
}

impl<'a> Uart<'a> {
    pub fn new(regs: &'a UartRegisters) -> Self {
        Self { regs }
    }

    /// Whether a TXDRDY event is pending
    pub fn tx_ready(&self) -> bool {
        self.regs.events_txdrdy.get() != 0
    }
}

impl UartTx for Uart<'_> {
    type Error = Infallible;

    fn start_tx(&mut self, first: u8) -> Result<(), Self::Error> {
        trigger(&self.regs.tasks_stoprx);
        trigger(&self.regs.tasks_stoptx);
        trigger(&self.regs.tasks_starttx);
        self.regs.txd.set(first as u32);
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.regs.txd.set(byte as u32);
        Ok(())
    }

    fn stop_tx(&mut self) -> Result<(), Self::Error> {
        trigger(&self.regs.tasks_stoptx);
        Ok(())
    }

    fn clear_tx_ready(&mut self) {
        clear(&self.regs.events_txdrdy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bareboard_hal::mock::{last_written, zeroed};

    #[test]
    fn test_configure_115200_no_flow_control() {
        let uart = zeroed::<UartRegisters>();
        configure(&uart, &UartPins::NRF52_DK, &UartConfig::default()).unwrap();

        assert_eq!(uart.pseltxd.get(), 6);
        assert_eq!(uart.pselrxd.get(), 8);
        assert_eq!(uart.pselrts.get(), DISCONNECTED);
        assert_eq!(uart.baudrate.get(), 0x01D7_E000);
        assert_eq!(uart.config.get(), 0);
        assert_eq!(uart.intenset.get(), 1 << 7);
        assert_eq!(uart.enable.get(), 4);
    }

    #[test]
    fn test_configure_flow_control_and_parity() {
        let uart = zeroed::<UartRegisters>();
        let config = UartConfig {
            baudrate: 9600,
            parity: Parity::Even,
            hardware_flow_control: true,
        };
        configure(&uart, &UartPins::NRF51_DK, &config).unwrap();

        assert_eq!(uart.pselrts.get(), 8);
        assert_eq!(uart.pselcts.get(), 10);
        assert_eq!(uart.config.get(), 0b1111);
        assert_eq!(uart.baudrate.get(), 0x0027_5000);
    }

    #[test]
    fn test_unsupported_baudrate() {
        let uart = zeroed::<UartRegisters>();
        let config = UartConfig {
            baudrate: 12345,
            ..UartConfig::default()
        };
        assert_eq!(
            configure(&uart, &UartPins::NRF51_DK, &config),
            Err(Error::UnsupportedBaudrate(12345))
        );
        assert_eq!(uart.pseltxd.get(), 0);
        assert_eq!(uart.enable.get(), 0);
    }

    #[test]
    fn test_transmit_sequence() {
        let regs = zeroed::<UartRegisters>();
        let mut main = Uart::new(&regs);
        let mut handler = main;

        main.start_tx(b'T').unwrap();
        assert_eq!(last_written(&regs.tasks_starttx), 1);
        assert_eq!(last_written(&regs.txd), b'T' as u32);

        regs.events_txdrdy.set(1);
        assert!(handler.tx_ready());
        handler.clear_tx_ready();
        handler.write_byte(b'e').unwrap();
        assert!(!handler.tx_ready());
        assert_eq!(last_written(&regs.txd), b'e' as u32);

        handler.stop_tx().unwrap();
        assert_eq!(last_written(&regs.tasks_stoptx), 1);
    }
}
