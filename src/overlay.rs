//! Label overlays for swap mode.
//!
//! Each label is a small override-redirect window centered on the window it
//! names, showing one character in the core X "fixed" font.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use coltile::config::Theme;
use coltile::types::Rect;

/// Side of a label window in pixels.
const LABEL_SIZE: u16 = 24;

/// Glyph cell of the "fixed" font.
const GLYPH_WIDTH: i16 = 6;
const GLYPH_ASCENT: i16 = 10;

struct Label {
    window: Window,
    key: char,
}

/// The label windows currently on screen.
pub struct LabelOverlay {
    labels: Vec<Label>,
    font: Font,
    gc: Gcontext,
}

impl LabelOverlay {
    /// Open the label font and graphics context.
    pub fn new(conn: &impl Connection, root: Window, theme: &Theme) -> Result<Self> {
        let font = conn.generate_id()?;
        conn.open_font(font, b"fixed")?;

        let gc = conn.generate_id()?;
        conn.create_gc(
            gc,
            root,
            &CreateGCAux::new()
                .font(font)
                .foreground(theme.label_fg)
                .background(theme.label_bg),
        )?;

        Ok(Self {
            labels: Vec::new(),
            font,
            gc,
        })
    }

    /// Show `key` centered on `target`.
    pub fn show(
        &mut self,
        conn: &impl Connection,
        root: Window,
        target: Rect,
        key: char,
        theme: &Theme,
    ) -> Result<()> {
        let window = conn.generate_id()?;
        let (x, y) = label_origin(target);

        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            root,
            x,
            y,
            LABEL_SIZE,
            LABEL_SIZE,
            1,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .background_pixel(theme.label_bg)
                .border_pixel(theme.label_fg)
                .override_redirect(1)
                .event_mask(EventMask::EXPOSURE),
        )?;
        conn.map_window(window)?;
        conn.configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;

        let label = Label { window, key };
        self.draw(conn, &label)?;
        self.labels.push(label);
        conn.flush()?;
        Ok(())
    }

    /// Redraw a label after an Expose. Returns false if `window` is not a label.
    pub fn expose(&self, conn: &impl Connection, window: Window) -> Result<bool> {
        match self.labels.iter().find(|l| l.window == window) {
            Some(label) => {
                self.draw(conn, label)?;
                conn.flush()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Destroy every label window.
    pub fn clear(&mut self, conn: &impl Connection) -> Result<()> {
        for label in self.labels.drain(..) {
            conn.destroy_window(label.window)?;
        }
        conn.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Release the font and graphics context.
    pub fn close(&mut self, conn: &impl Connection) -> Result<()> {
        self.clear(conn)?;
        conn.free_gc(self.gc)?;
        conn.close_font(self.font)?;
        Ok(())
    }

    fn draw(&self, conn: &impl Connection, label: &Label) -> Result<()> {
        let mut buf = [0u8; 4];
        let text = label.key.encode_utf8(&mut buf);
        let x = (LABEL_SIZE as i16 - GLYPH_WIDTH) / 2;
        let y = (LABEL_SIZE as i16 + GLYPH_ASCENT) / 2;
        conn.image_text8(label.window, self.gc, x, y, text.as_bytes())?;
        Ok(())
    }
}

/// Top-left corner of a label centered on `target`.
fn label_origin(target: Rect) -> (i16, i16) {
    let half = LABEL_SIZE as i32 / 2;
    (
        (target.center_x() - half) as i16,
        (target.center_y() - half) as i16,
    )
}
