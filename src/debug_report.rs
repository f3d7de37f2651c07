use soundlaw::Applied;

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(word: &str, applied: &Applied, color: bool) {
    let palette = ansi::Palette::new(color);
    println!(
        "{} {} {}",
        palette.bold(palette.paint(word, ansi::CYAN)),
        palette.dim("→"),
        palette.bold(palette.paint(&applied.word, ansi::GREEN)),
    );

    if !applied.trace.is_empty() {
        println!("\n{}", palette.paint("━━━ Derivation ━━━", ansi::GRAY));
        for line in applied.trace.lines() {
            // Stage summaries look like "path.to.stage: word"; indent the
            // per-rule lines under them.
            if let Some((stage, rest)) = line.split_once(": ") {
                if !stage.contains(' ') {
                    println!("  {} {}", palette.paint(format!("{stage}:"), ansi::CYAN), palette.bold(rest));
                    continue;
                }
            }
            println!("    {}", palette.dim(line));
        }
    }

    println!("\n{}", palette.dim(format!("elapsed: {:?}", applied.elapsed)));
}
