use crate::arena::{Mode, Versus};
use crate::config::Config;
use crate::game::Game;
use ratatui::{backend::Backend, Terminal};
use std::io;
use std::time::Instant;

#[derive(Debug)]
pub(crate) struct App {
    screen: Screen,
    /// All game time is measured from here
    origin: Instant,
}

impl App {
    pub(crate) fn new(config: &Config, versus: Option<Mode>) -> App {
        let screen = match versus {
            Some(mode) => Screen::Versus(Box::new(Versus::new(mode))),
            None => Screen::Solo(Box::new(Game::new(config))),
        };
        App {
            screen,
            origin: Instant::now(),
        }
    }

    pub(crate) fn run<B: Backend>(mut self, mut terminal: Terminal<B>) -> io::Result<()> {
        while !self.quitting() {
            self.frame()?;
            self.draw(&mut terminal)?;
            self.process_input()?;
        }
        Ok(())
    }

    fn frame(&mut self) -> io::Result<()> {
        let now = self.origin.elapsed();
        match self.screen {
            Screen::Solo(ref mut game) => game.frame(now)?,
            Screen::Versus(ref mut versus) => versus.frame(now),
            Screen::Quit => (),
        }
        Ok(())
    }

    fn draw<B: Backend>(&self, terminal: &mut Terminal<B>) -> io::Result<()> {
        match self.screen {
            Screen::Solo(ref game) => {
                terminal.draw(|frame| game.draw(frame))?;
            }
            Screen::Versus(ref versus) => {
                terminal.draw(|frame| versus.draw(frame))?;
            }
            Screen::Quit => (),
        }
        Ok(())
    }

    fn process_input(&mut self) -> io::Result<()> {
        let next = match self.screen {
            Screen::Solo(ref mut game) => game.process_input()?,
            Screen::Versus(ref mut versus) => versus.process_input()?,
            Screen::Quit => None,
        };
        if let Some(screen) = next {
            self.screen = screen;
        }
        Ok(())
    }

    fn quitting(&self) -> bool {
        matches!(self.screen, Screen::Quit)
    }
}

#[derive(Debug)]
pub(crate) enum Screen {
    Solo(Box<Game>),
    Versus(Box<Versus>),
    Quit,
}
