/// Braille spinner shown next to "Thinking..." while a command is in flight
pub struct Spinner {
    frames: &'static [&'static str],
    current: usize,
}

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

impl Spinner {
    pub fn new() -> Self {
        Self {
            frames: FRAMES,
            current: 0,
        }
    }

    pub fn tick(&mut self) {
        self.current = (self.current + 1) % self.frames.len();
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }

    pub fn current(&self) -> &'static str {
        self.frames[self.current]
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}
