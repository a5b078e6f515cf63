//! MIPI DCS panel on SPI
//!
//! Every flushed chunk selects its address window with CASET/RASET and then
//! streams the pixel bytes with RAMWR. The data/command pin is driven low
//! for command bytes and high for parameters and pixel data.
//!
//! The transfer is blocking: the flush-complete signal is raised as soon as
//! the bytes have been written. Boards with SPI DMA implement
//! [`FlushTarget`] themselves and raise the signal from the DMA interrupt.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use tessera_core::error::Error;
use tessera_core::geometry::Rect;
use tessera_core::screen::FlushSignal;
use tessera_core::traits::FlushTarget;

/// MIPI DCS command opcodes
pub mod dcs {
    /// Column address set
    pub const CASET: u8 = 0x2A;
    /// Row address set
    pub const RASET: u8 = 0x2B;
    /// Memory write
    pub const RAMWR: u8 = 0x2C;
}

/// SPI panel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError<SpiE, PinE> {
    /// SPI transfer failed
    Spi(SpiE),
    /// Data/command pin could not be driven
    Pin(PinE),
}

impl<SpiE, PinE> From<PanelError<SpiE, PinE>> for Error {
    fn from(err: PanelError<SpiE, PinE>) -> Self {
        match err {
            PanelError::Spi(_) => Error::IoError,
            PanelError::Pin(_) => Error::DeviceError,
        }
    }
}

/// Flush target for a DCS panel with a data/command pin
pub struct SpiPanel<'s, SPI, DC> {
    spi: SPI,
    dc: DC,
    signal: &'s FlushSignal,
    /// Panel RAM position of screen (0, 0)
    x_offset: u16,
    y_offset: u16,
    /// First error since the last `take_error`
    last_error: Option<Error>,
}

impl<'s, SPI, DC> SpiPanel<'s, SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    /// Create a panel driver that raises `signal` after every chunk
    pub fn new(spi: SPI, dc: DC, signal: &'s FlushSignal) -> Self {
        Self {
            spi,
            dc,
            signal,
            x_offset: 0,
            y_offset: 0,
            last_error: None,
        }
    }

    /// Shift the address window, for panels whose visible area does not
    /// start at RAM (0, 0) (e.g. 240x240 ST7789 modules)
    pub fn with_offset(mut self, x_offset: u16, y_offset: u16) -> Self {
        self.x_offset = x_offset;
        self.y_offset = y_offset;
        self
    }

    /// Send one command with its parameters
    pub fn command(
        &mut self,
        cmd: u8,
        params: &[u8],
    ) -> Result<(), PanelError<SPI::Error, DC::Error>> {
        self.dc.set_low().map_err(PanelError::Pin)?;
        self.spi.write(&[cmd]).map_err(PanelError::Spi)?;
        if !params.is_empty() {
            self.dc.set_high().map_err(PanelError::Pin)?;
            self.spi.write(params).map_err(PanelError::Spi)?;
        }
        Ok(())
    }

    /// Write pixels into a screen rectangle
    pub fn write_area(
        &mut self,
        area: Rect,
        pixels: &[u8],
    ) -> Result<(), PanelError<SPI::Error, DC::Error>> {
        let x1 = window(area.x1(), self.x_offset);
        let x2 = window(area.x2(), self.x_offset);
        let y1 = window(area.y1(), self.y_offset);
        let y2 = window(area.y2(), self.y_offset);

        self.command(dcs::CASET, &span(x1, x2))?;
        self.command(dcs::RASET, &span(y1, y2))?;
        self.command(dcs::RAMWR, pixels)
    }

    /// Error from the most recent failed flush, if any
    pub fn take_error(&mut self) -> Option<Error> {
        self.last_error.take()
    }

    /// Give back the bus and pin
    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }
}

impl<SPI, DC> FlushTarget for SpiPanel<'_, SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    fn flush(&mut self, area: Rect, pixels: &[u8]) {
        if let Err(err) = self.write_area(area, pixels) {
            #[cfg(feature = "defmt")]
            defmt::warn!("panel flush failed");
            if self.last_error.is_none() {
                self.last_error = Some(err.into());
            }
        }
        // The buffer is free again either way
        self.signal.complete();
    }
}

fn window(coord: i16, offset: u16) -> u16 {
    (coord.max(0) as u16).saturating_add(offset)
}

fn span(start: u16, end: u16) -> [u8; 4] {
    let [s1, s0] = start.to_be_bytes();
    let [e1, e0] = end.to_be_bytes();
    [s1, s0, e1, e0]
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;
    use core::convert::Infallible;

    use embedded_hal::digital::ErrorType as PinErrorType;
    use embedded_hal::spi::{ErrorKind, ErrorType, Operation};

    use super::*;
    use tessera_core::config::{ScreenConfig, UpdateMode};
    use tessera_core::screen::{Buffers, Screen, State};
    use tessera_core::surface::PixelFormat;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Dc(bool),
        Write(Vec<u8>),
    }

    struct MockSpi<'l> {
        log: &'l RefCell<Vec<Event>>,
        fail: bool,
    }

    impl ErrorType for MockSpi<'_> {
        type Error = ErrorKind;
    }

    impl SpiDevice for MockSpi<'_> {
        fn transaction(
            &mut self,
            operations: &mut [Operation<'_, u8>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            for op in operations.iter() {
                if let Operation::Write(data) = op {
                    self.log.borrow_mut().push(Event::Write(data.to_vec()));
                }
            }
            Ok(())
        }
    }

    struct MockPin<'l> {
        log: &'l RefCell<Vec<Event>>,
    }

    impl PinErrorType for MockPin<'_> {
        type Error = Infallible;
    }

    impl OutputPin for MockPin<'_> {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push(Event::Dc(false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push(Event::Dc(true));
            Ok(())
        }
    }

    #[test]
    fn test_flush_sets_window_and_writes_pixels() {
        let log = RefCell::new(Vec::new());
        let signal = FlushSignal::new();
        let mut panel = SpiPanel::new(
            MockSpi {
                log: &log,
                fail: false,
            },
            MockPin { log: &log },
            &signal,
        );

        panel.flush(Rect::new(10, 20, 11, 21), &[1, 2, 3, 4, 5, 6, 7, 8]);

        assert_eq!(
            log.into_inner(),
            [
                Event::Dc(false),
                Event::Write(vec![dcs::CASET]),
                Event::Dc(true),
                Event::Write(vec![0, 10, 0, 11]),
                Event::Dc(false),
                Event::Write(vec![dcs::RASET]),
                Event::Dc(true),
                Event::Write(vec![0, 20, 0, 21]),
                Event::Dc(false),
                Event::Write(vec![dcs::RAMWR]),
                Event::Dc(true),
                Event::Write(vec![1, 2, 3, 4, 5, 6, 7, 8]),
            ]
        );
    }

    #[test]
    fn test_offset_shifts_window() {
        let log = RefCell::new(Vec::new());
        let signal = FlushSignal::new();
        let mut panel = SpiPanel::new(
            MockSpi {
                log: &log,
                fail: false,
            },
            MockPin { log: &log },
            &signal,
        )
        .with_offset(0, 80);

        panel.write_area(Rect::new(0, 200, 239, 239), &[]).unwrap();

        let log = log.into_inner();
        assert_eq!(log[3], Event::Write(vec![0, 0, 0, 239]));
        assert_eq!(log[7], Event::Write(vec![1, 24, 1, 63]));
    }

    #[test]
    fn test_flush_completes_signal() {
        let log = RefCell::new(Vec::new());
        let signal = FlushSignal::new();
        let mut panel = SpiPanel::new(
            MockSpi {
                log: &log,
                fail: false,
            },
            MockPin { log: &log },
            &signal,
        );

        // A DMA-less panel finishes before `flush` returns
        let mut buf = [0u8; 640];
        let mut screen = Screen::new(
            ScreenConfig::default(),
            Buffers::Single(&mut buf),
            &signal,
            &mut panel,
        )
        .unwrap();
        screen.invalidate(Rect::new(0, 0, 3, 1)).unwrap();
        assert_eq!(screen.update(true), Ok(State::Idle));
        drop(screen);

        assert_eq!(panel.take_error(), None);
        let writes = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Write(_)))
            .count();
        assert_eq!(writes, 6);
    }

    #[test]
    fn test_direct_mode_writes_only_the_window() {
        let log = RefCell::new(Vec::new());
        let signal = FlushSignal::new();
        let mut panel = SpiPanel::new(
            MockSpi {
                log: &log,
                fail: false,
            },
            MockPin { log: &log },
            &signal,
        );

        let mut frame = [0u8; 32];
        let config = ScreenConfig::new(8, 4, PixelFormat::Gray8)
            .with_mode(UpdateMode::Direct)
            .with_background(3);
        let mut screen =
            Screen::new(config, Buffers::Single(&mut frame), &signal, &mut panel).unwrap();
        screen.invalidate(Rect::new(5, 0, 6, 0)).unwrap();
        assert_eq!(screen.update(true), Ok(State::Idle));
        drop(screen);

        let log = log.into_inner();
        assert_eq!(log.len(), 12);
        assert_eq!(log[3], Event::Write(vec![0, 5, 0, 6]));
        assert_eq!(log[7], Event::Write(vec![0, 0, 0, 0]));
        assert_eq!(log[11], Event::Write(vec![3, 3]));
    }

    #[test]
    fn test_bus_error_is_kept_and_signal_released() {
        let log = RefCell::new(Vec::new());
        let signal = FlushSignal::new();
        let mut panel = SpiPanel::new(
            MockSpi {
                log: &log,
                fail: true,
            },
            MockPin { log: &log },
            &signal,
        );

        panel.flush(Rect::new(0, 0, 0, 0), &[0, 0]);
        assert_eq!(signal.state(0), tessera_core::screen::SlotState::Idle);
        assert_eq!(panel.take_error(), Some(Error::IoError));
        assert_eq!(panel.take_error(), None);
    }

    #[test]
    fn test_panel_error_conversion() {
        let spi: PanelError<ErrorKind, Infallible> = PanelError::Spi(ErrorKind::Other);
        assert_eq!(Error::from(spi), Error::IoError);
        let pin: PanelError<ErrorKind, ErrorKind> = PanelError::Pin(ErrorKind::Other);
        assert_eq!(Error::from(pin), Error::DeviceError);
    }
}
