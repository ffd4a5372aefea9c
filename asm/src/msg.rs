use color_print::cprintln;

#[derive(Debug)]
pub enum Msg {
    Error(String),
    Warn(String),
    Note(String),
}

impl Msg {
    pub fn print(&self) {
        match self {
            Msg::Error(msg) => cprintln!("<red,bold>error</>: {}", msg),
            Msg::Warn(msg) => cprintln!("<yellow,bold>warn</>: {}", msg),
            Msg::Note(msg) => cprintln!("<green,bold>note</>: {}", msg),
        }
    }

    /// Points at statement `idx` (0-based) of `file`.
    pub fn diag(&self, file: &str, idx: usize, stmt: &str) {
        self.print();
        cprintln!("     <blue>--></> <underline>{}:#{}</>", file, idx + 1);
        cprintln!("      <blue>|</>");
        cprintln!(" <blue>{:>4} |</> {}", idx + 1, stmt);
        cprintln!("      <blue>|</>");
    }
}
