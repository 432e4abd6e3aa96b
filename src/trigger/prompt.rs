use std::io::{BufRead, Write};

use miette::{Context, IntoDiagnostic};

use crate::result::Result;

use super::{CycleTrigger, Trigger};

const PROMPT: &str = "Create a gif? y/Y:yes, q/Q:quit";

/// Ask on the console before every cycle.
///
/// Lines other than `y` or `q` are ignored. The end of the input quits.
pub struct PromptTrigger<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptTrigger<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> CycleTrigger for PromptTrigger<R, W> {
    fn next_event(&mut self) -> Result<Trigger> {
        let mut line = String::new();
        loop {
            writeln!(self.output, "{PROMPT}")?;
            self.output.flush()?;

            line.clear();
            let read = self
                .input
                .read_line(&mut line)
                .into_diagnostic()
                .wrap_err("Could not read the answer")?;
            if read == 0 {
                return Ok(Trigger::Quit);
            }

            match line.trim().to_lowercase().as_str() {
                "y" => return Ok(Trigger::MakeGif),
                "q" => return Ok(Trigger::Quit),
                _ => continue,
            }
        }
    }
}
