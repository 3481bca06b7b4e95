use minifb::{Key, Scale, Window, WindowOptions};

use chipvm::{Frame, HEIGHT, WIDTH};

// 1 2 3 C      1 2 3 4
// 4 5 6 D  <-  Q W E R
// 7 8 9 E      A S D F
// A 0 B F      Z X C V
const KEYMAP: [(Key, u8); 16] = [
    (Key::Key1, 0x1),
    (Key::Key2, 0x2),
    (Key::Key3, 0x3),
    (Key::Key4, 0xC),
    (Key::Q, 0x4),
    (Key::W, 0x5),
    (Key::E, 0x6),
    (Key::R, 0xD),
    (Key::A, 0x7),
    (Key::S, 0x8),
    (Key::D, 0x9),
    (Key::F, 0xE),
    (Key::Z, 0xA),
    (Key::X, 0x0),
    (Key::C, 0xB),
    (Key::V, 0xF),
];

const PIXEL_ON: u32 = from_u8_rgb(0, 127, 255);
const PIXEL_OFF: u32 = from_u8_rgb(0, 0, 0);

const fn from_u8_rgb(r: u8, g: u8, b: u8) -> u32 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    (r << 16) | (g << 8) | b
}

/// The host side: shows published frames and reports which mapped keys are
/// held down.
pub struct Screen {
    window: Window,
    pixel_buffer: Vec<u32>,
}

impl Screen {
    pub fn new(scale: u8) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "chipvm - ESC to exit",
            WIDTH,
            HEIGHT,
            WindowOptions {
                scale: scale_for(scale),
                ..WindowOptions::default()
            },
        )?;
        window.set_position(500, 300);
        Ok(Self {
            window,
            pixel_buffer: vec![PIXEL_OFF; WIDTH * HEIGHT],
        })
    }

    pub fn is_running(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    pub fn keypad_state(&self) -> u16 {
        KEYMAP
            .iter()
            .filter(|(key, _)| self.window.is_key_down(*key))
            .fold(0, |mask, &(_, num)| mask | (1 << num))
    }

    pub fn draw(&mut self, frame: &Frame) -> Result<(), minifb::Error> {
        for (y, row) in frame.iter().enumerate() {
            for x in 0..WIDTH {
                let lit = row[x / 8] & (0x80 >> (x % 8)) != 0;
                self.pixel_buffer[y * WIDTH + x] = if lit { PIXEL_ON } else { PIXEL_OFF };
            }
        }
        self.window
            .update_with_buffer(&self.pixel_buffer, WIDTH, HEIGHT)
    }

    /// Pumps window events without a new frame.
    pub fn refresh(&mut self) {
        self.window.update();
    }
}

fn scale_for(factor: u8) -> Scale {
    match factor {
        0 | 1 => Scale::X1,
        2 => Scale::X2,
        3 | 4 => Scale::X4,
        5..=8 => Scale::X8,
        9..=16 => Scale::X16,
        _ => Scale::X32,
    }
}
