//! The host side: owns the machine, paces it and connects it to the outside.
//!
//! Instruction throughput and timer rate are independent. Each frame lasts
//! `1 / timer_hz` seconds and runs `instructions_per_second / timer_hz`
//! cycles followed by exactly one timer tick.

use crate::config::Config;
use crate::display::Display;
use crate::input::Input;
use crate::interpreter::{Chip8Interpreter, Cycle};
use crate::sound::Sound;
use log::{info, warn};
use std::error::Error;
use std::time::Instant;

pub struct Environment<'a> {
    interpreter: Chip8Interpreter,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    config: Config,
}

impl<'a> Environment<'a> {
    pub fn new(
        interpreter: Chip8Interpreter,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
        config: Config,
    ) -> Self {
        Environment {
            interpreter,
            display,
            input,
            sound,
            config,
        }
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    /// Run frames until the user quits, `max_frames` is reached or the machine
    /// hits a fatal error. Returns how many frames ran.
    pub fn run(&mut self) -> Result<u64, Box<dyn Error>> {
        info!(
            "running at {} instructions/s, {} per frame, timers at {}Hz",
            self.config.instructions_per_second,
            self.config.cycles_per_frame(),
            self.config.timer_hz
        );
        let frame_duration = self.config.frame_duration();
        let mut deadline = Instant::now();
        let mut frames = 0u64;

        let outcome = loop {
            if self.input.quit_requested() {
                break Ok(());
            }
            if self.config.max_frames.map_or(false, |max| frames >= max) {
                break Ok(());
            }
            if let Err(e) = self.run_frame() {
                break Err(e);
            }
            frames += 1;

            deadline += frame_duration;
            let now = Instant::now();
            if deadline > now {
                spin_sleep::sleep(deadline - now);
            } else {
                // running behind; don't try to catch up
                deadline = now;
            }
        };

        if let Err(e) = self.sound.follow_timer(0) {
            warn!("could not silence sound: {}", e);
        }
        info!("stopped after {} frames", frames);
        outcome.map(|_| frames)
    }

    /// one frame: sample keys, run the frame's cycles, tick timers, then bring
    /// sound and screen up to date
    pub fn run_frame(&mut self) -> Result<(), Box<dyn Error>> {
        let keypad = self.input.poll_keys()?;
        self.interpreter.set_keypad(keypad);

        for _ in 0..self.config.cycles_per_frame() {
            // the keypad can't change until the next poll
            if self.interpreter.step()? == Cycle::WaitingForKey {
                break;
            }
        }
        self.interpreter.tick_timers();

        if let Err(e) = self.sound.follow_timer(self.interpreter.sound_timer()) {
            warn!("sound device: {}", e);
        }
        if self.interpreter.take_redraw() {
            self.display.draw(self.interpreter.framebuffer())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::error::Chip8Error;
    use crate::input::{DummyInput, Keypad};
    use crate::sound::Mute;

    fn fast_config(frames: u64) -> Config {
        Config {
            instructions_per_second: 10_000,
            timer_hz: 1_000,
            seed: Some(7),
            max_frames: Some(frames),
            ..Config::default()
        }
    }

    fn interpreter(program: &[u8]) -> Chip8Interpreter {
        let mut i = Chip8Interpreter::with_seed(7);
        i.load(program).unwrap();
        i
    }

    #[test]
    fn test_runs_requested_frames() -> Result<(), Box<dyn Error>> {
        let (mut display, mut sound) = (DummyDisplay::new(), Mute::new());
        let mut input = DummyInput::new(&[Keypad::new(); 10]);
        // LD V1, 1; ADD V0, V1; JP 0x202
        let program = [0x61, 0x01, 0x80, 0x14, 0x12, 0x02];
        let mut env = Environment::new(
            interpreter(&program),
            &mut display,
            &mut input,
            &mut sound,
            fast_config(3),
        );
        assert_eq!(env.run()?, 3);
        // ten cycles per frame
        assert_eq!(env.interpreter().registers()[0], 15);
        Ok(())
    }

    #[test]
    fn test_stops_when_input_quits() -> Result<(), Box<dyn Error>> {
        let (mut display, mut sound) = (DummyDisplay::new(), Mute::new());
        let mut input = DummyInput::new(&[Keypad::new(); 2]);
        let mut config = fast_config(0);
        config.max_frames = None;
        let mut env = Environment::new(
            interpreter(&[0x12, 0x00]),
            &mut display,
            &mut input,
            &mut sound,
            config,
        );
        assert_eq!(env.run()?, 3);
        Ok(())
    }

    #[test]
    fn test_timers_tick_once_per_frame() -> Result<(), Box<dyn Error>> {
        let (mut display, mut sound) = (DummyDisplay::new(), Mute::new());
        let mut input = DummyInput::new(&[]);
        // LD V0, 200; LD DT, V0; JP 0x204
        let program = [0x60, 200, 0xf0, 0x15, 0x12, 0x04];
        let mut env = Environment::new(
            interpreter(&program),
            &mut display,
            &mut input,
            &mut sound,
            fast_config(0),
        );
        for _ in 0..5 {
            env.run_frame()?;
        }
        assert_eq!(env.interpreter().delay_timer(), 195);
        Ok(())
    }

    #[test]
    fn test_sound_follows_sound_timer() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut sound = Mute::new();
        let mut input = DummyInput::new(&[]);
        // LD V0, 2; LD ST, V0; JP 0x204
        let program = [0x60, 0x02, 0xf0, 0x18, 0x12, 0x04];
        {
            let mut env = Environment::new(
                interpreter(&program),
                &mut display,
                &mut input,
                &mut sound,
                fast_config(0),
            );
            env.run_frame()?;
            assert_eq!(env.interpreter().sound_timer(), 1);
        }
        assert!(sound.is_beeping());
        {
            let mut env = Environment::new(
                interpreter(&[0x12, 0x00]),
                &mut display,
                &mut input,
                &mut sound,
                fast_config(0),
            );
            env.run_frame()?;
        }
        assert!(!sound.is_beeping());
        assert_eq!(sound.transitions, 2);
        Ok(())
    }

    #[test]
    fn test_redraws_only_after_drawing() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let (mut input, mut sound) = (DummyInput::new(&[]), Mute::new());
        // LD F, V0; DRW V0, V0, 5; JP 0x204
        let program = [0xf0, 0x29, 0xd0, 0x05, 0x12, 0x04];
        {
            let mut env = Environment::new(
                interpreter(&program),
                &mut display,
                &mut input,
                &mut sound,
                fast_config(0),
            );
            for _ in 0..4 {
                env.run_frame()?;
            }
        }
        assert_eq!(display.frames_drawn, 1);
        let frame = display.last_frame.expect("a frame was drawn");
        assert!(frame.get(0, 0));
        Ok(())
    }

    #[test]
    fn test_key_wait_resumes_on_key() -> Result<(), Box<dyn Error>> {
        let (mut display, mut sound) = (DummyDisplay::new(), Mute::new());
        let script = [Keypad::new(), Keypad::new(), Keypad::from_keys(&[0xC])];
        let mut input = DummyInput::new(&script);
        // LD V3, K; JP 0x202
        let program = [0xf3, 0x0a, 0x12, 0x02];
        let mut env = Environment::new(
            interpreter(&program),
            &mut display,
            &mut input,
            &mut sound,
            fast_config(0),
        );
        env.run_frame()?;
        env.run_frame()?;
        assert_eq!(env.interpreter().program_counter(), 0x200);
        env.run_frame()?;
        assert_eq!(env.interpreter().registers()[3], 0xC);
        assert_eq!(env.interpreter().program_counter(), 0x202);
        Ok(())
    }

    #[test]
    fn test_fatal_error_stops_the_run() {
        let (mut display, mut sound) = (DummyDisplay::new(), Mute::new());
        let mut input = DummyInput::new(&[Keypad::new(); 10]);
        let mut env = Environment::new(
            interpreter(&[0x00, 0xee]),
            &mut display,
            &mut input,
            &mut sound,
            fast_config(5),
        );
        let err = env.run().unwrap_err();
        assert_eq!(
            err.downcast_ref::<Chip8Error>(),
            Some(&Chip8Error::StackUnderflow { pc: 0x200 })
        );
    }
}
