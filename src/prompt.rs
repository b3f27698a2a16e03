use std::io::{self, BufRead, Write};

/// Line-oriented question/answer source for the interactive parts of the tool.
pub trait Prompter {
    /// Show `message` and return the entered line without its line ending.
    /// A closed input yields `UnexpectedEof`.
    fn ask(&mut self, message: &str) -> io::Result<String>;
}

/// Prompts on a writer and reads answers from a reader (stdin/stdout in the binary).
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Console::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for Console<R, W> {
    fn ask(&mut self, message: &str) -> io::Result<String> {
        self.output.write_all(message.as_bytes())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            ));
        }
        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(line)
    }
}

/// Ask `message` until `accept` takes the trimmed answer.
pub fn ask_until<P, F>(prompter: &mut P, message: &str, accept: F) -> io::Result<String>
where
    P: Prompter + ?Sized,
    F: Fn(&str) -> bool,
{
    loop {
        let answer = prompter.ask(message)?;
        let answer = answer.trim();
        if accept(answer) {
            return Ok(answer.to_string());
        }
    }
}
