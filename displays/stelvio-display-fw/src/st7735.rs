//! ST7735 LCD driver
//!
//! Driver for 128x160 ST7735-based TFT panels over SPI. The F042 has
//! nowhere near enough RAM for a 16-bit frame buffer, so drawing streams
//! pixels directly through the panel's address window. Text rendering
//! goes through `embedded-graphics` (mono fonts draw whole glyph cells
//! contiguously, which maps onto one window per glyph).

use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Blocking;
use embassy_stm32::spi::Spi;
use embassy_time::{Duration, Timer};
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::raw::ToBytes;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};

use stelvio_display::{DisplayError, TextBackend, HUD_COLS, HUD_ROWS};

/// Panel dimensions
pub const WIDTH: u16 = 128;
pub const HEIGHT: u16 = 160;

/// Character cell geometry for the HUD grid
const CELL_WIDTH: u16 = 6;
const ROW_PITCH: u16 = 14;
const GRID_TOP: u16 = 8;
const GRID_LEFT: u16 = 1;

/// ST7735 commands
#[allow(dead_code)]
mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const INVOFF: u8 = 0x20;
    pub const INVON: u8 = 0x21;
    pub const DISPOFF: u8 = 0x28;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
    pub const NORON: u8 = 0x13;
}

/// ST7735 TFT driver
pub struct St7735<'d> {
    spi: Spi<'d, Blocking>,
    dc: Output<'d>,
    rst: Output<'d>,
    cs: Output<'d>,
}

impl<'d> St7735<'d> {
    /// Create a new driver. `dc` high = data, low = command.
    pub fn new(spi: Spi<'d, Blocking>, dc: Output<'d>, rst: Output<'d>, cs: Output<'d>) -> Self {
        Self { spi, dc, rst, cs }
    }

    /// Hardware reset followed by the panel init sequence.
    pub async fn init(&mut self) -> Result<(), DisplayError> {
        self.rst.set_low();
        Timer::after(Duration::from_millis(50)).await;
        self.rst.set_high();
        Timer::after(Duration::from_millis(150)).await;

        self.command(cmd::SWRESET, &[])?;
        Timer::after(Duration::from_millis(150)).await;
        self.command(cmd::SLPOUT, &[])?;
        Timer::after(Duration::from_millis(150)).await;

        // 16-bit color, row/column order for portrait orientation
        self.command(cmd::COLMOD, &[0x05])?;
        self.command(cmd::MADCTL, &[0x00])?;
        self.command(cmd::INVOFF, &[])?;
        self.command(cmd::NORON, &[])?;

        self.blank(Rgb565::BLACK)?;
        self.command(cmd::DISPON, &[])?;
        Timer::after(Duration::from_millis(100)).await;

        Ok(())
    }

    /// Send a command byte with optional parameters.
    fn command(&mut self, command: u8, params: &[u8]) -> Result<(), DisplayError> {
        self.cs.set_low();
        self.dc.set_low();
        let mut result = self.spi.blocking_write(&[command]);
        if result.is_ok() && !params.is_empty() {
            self.dc.set_high();
            result = self.spi.blocking_write(params);
        }
        self.cs.set_high();
        result.map_err(|_| DisplayError::Communication)
    }

    /// Open an address window; subsequent RAMWR data fills it row-major.
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), DisplayError> {
        self.command(
            cmd::CASET,
            &[(x0 >> 8) as u8, x0 as u8, (x1 >> 8) as u8, x1 as u8],
        )?;
        self.command(
            cmd::RASET,
            &[(y0 >> 8) as u8, y0 as u8, (y1 >> 8) as u8, y1 as u8],
        )?;
        self.command(cmd::RAMWR, &[])
    }

    /// Stream one color into the open window `count` times.
    fn push_color(&mut self, color: Rgb565, count: u32) -> Result<(), DisplayError> {
        let bytes = color.to_be_bytes();
        // Chunked writes keep the transfer count sane without a buffer
        // per pixel
        let mut chunk = [0u8; 64];
        for pair in chunk.chunks_exact_mut(2) {
            pair.copy_from_slice(&bytes);
        }

        self.cs.set_low();
        self.dc.set_high();
        let mut remaining = count as usize * 2;
        while remaining > 0 {
            let n = remaining.min(chunk.len());
            if self.spi.blocking_write(&chunk[..n]).is_err() {
                self.cs.set_high();
                return Err(DisplayError::Communication);
            }
            remaining -= n;
        }
        self.cs.set_high();
        Ok(())
    }

    /// Fill the whole panel with one color.
    pub fn blank(&mut self, color: Rgb565) -> Result<(), DisplayError> {
        self.set_window(0, 0, WIDTH - 1, HEIGHT - 1)?;
        self.push_color(color, WIDTH as u32 * HEIGHT as u32)
    }

    fn hud_style(&self) -> MonoTextStyle<'static, Rgb565> {
        // Background color makes glyph cells draw contiguously, one
        // window per glyph instead of one per pixel
        MonoTextStyleBuilder::new()
            .font(&FONT_6X10)
            .text_color(Rgb565::WHITE)
            .background_color(Rgb565::BLACK)
            .build()
    }
}

impl OriginDimensions for St7735<'_> {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for St7735<'_> {
    type Color = Rgb565;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 || point.x >= WIDTH as i32 || point.y >= HEIGHT as i32 {
                continue;
            }
            let (x, y) = (point.x as u16, point.y as u16);
            self.set_window(x, y, x, y)?;
            self.push_color(color, 1)?;
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        // Partial off-screen fills fall back to per-pixel clipping
        if area.top_left.x < 0
            || area.top_left.y < 0
            || bottom_right.x >= WIDTH as i32
            || bottom_right.y >= HEIGHT as i32
        {
            return self.draw_iter(
                area.points()
                    .zip(colors)
                    .map(|(point, color)| Pixel(point, color)),
            );
        }

        self.set_window(
            area.top_left.x as u16,
            area.top_left.y as u16,
            bottom_right.x as u16,
            bottom_right.y as u16,
        )?;

        self.cs.set_low();
        self.dc.set_high();
        for color in colors {
            if self.spi.blocking_write(&color.to_be_bytes()).is_err() {
                self.cs.set_high();
                return Err(DisplayError::Communication);
            }
        }
        self.cs.set_high();
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounding_box());
        let Some(bottom_right) = clipped.bottom_right() else {
            return Ok(());
        };
        self.set_window(
            clipped.top_left.x as u16,
            clipped.top_left.y as u16,
            bottom_right.x as u16,
            bottom_right.y as u16,
        )?;
        self.push_color(color, clipped.size.width * clipped.size.height)
    }
}

impl TextBackend for St7735<'_> {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.blank(Rgb565::BLACK)
    }

    fn draw_text(&mut self, row: u8, col: u8, text: &str) -> Result<(), DisplayError> {
        if row as usize >= HUD_ROWS || col as usize >= HUD_COLS {
            return Err(DisplayError::InvalidCoordinates);
        }
        let style = self.hud_style();
        let origin = Point::new(
            (GRID_LEFT + col as u16 * CELL_WIDTH) as i32,
            (GRID_TOP + row as u16 * ROW_PITCH) as i32,
        );
        Text::with_baseline(text, origin, style, Baseline::Top).draw(self)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        // Unbuffered: pixels hit the panel as they are drawn
        Ok(())
    }
}
