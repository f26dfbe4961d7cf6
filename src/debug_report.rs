use dctfinder::{DocumentMetrics, PageInfo};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
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

pub fn print_page(name: &str, info: &PageInfo, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Page: {name}"), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Title ━━━", ansi::GRAY));
    if info.title.is_empty() {
        println!("{}", palette.dim("  No title found"));
    } else {
        println!("  {}", palette.bold(&info.title));
    }

    println!("\n{}", palette.paint("━━━ Candidates ━━━", ansi::GRAY));
    print_candidates(info, &palette);

    println!("\n{}", palette.paint("━━━ Date ━━━", ansi::GRAY));
    match info.date {
        Some(date) => {
            let source = if info.date_text.is_empty() { "from URL".to_string() } else { format!("\"{}\"", info.date_text) };
            println!(
                "  {} {} {}",
                palette.bold(palette.paint(date.format("%Y-%m-%d").to_string(), ansi::GREEN)),
                palette.dim("│"),
                palette.paint(source, ansi::YELLOW)
            );
        }
        None => println!("{}", palette.dim("  No date resolved")),
    }
    if let Some(reference) = &info.reference {
        let expected = reference.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".to_string());
        let mark = if reference.date == info.date {
            palette.paint("✓", ansi::GREEN)
        } else {
            palette.paint("✗", ansi::RED)
        };
        println!("  {} {} {}", palette.dim("reference:"), palette.paint(expected, ansi::BLUE), mark);
        if !reference.title.is_empty() {
            println!("  {} {}", palette.dim("reference title:"), palette.paint(reference.title.trim(), ansi::BLUE));
        }
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    print_metrics(&info.metrics, &palette);
    println!();
}

fn print_candidates(info: &PageInfo, palette: &ansi::Palette) {
    let pool = &info.candidates;
    if pool.is_empty() {
        println!("{}", palette.dim("  No labeled spans"));
        return;
    }
    for (idx, text) in pool.first.iter().enumerate() {
        let score = pool.scores.get(idx).map(|s| format!("{s:.3}")).unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {} {} {}",
            palette.paint(format!("[{idx}]"), ansi::GRAY),
            palette.paint(text, ansi::GREEN),
            palette.dim("│ score:"),
            palette.paint(score, ansi::YELLOW)
        );
    }
    for text in &pool.second {
        println!("  {} {}", palette.dim("[?]"), palette.dim(text));
    }
}

fn print_metrics(metrics: &DocumentMetrics, palette: &ansi::Palette) {
    println!(
        "  Total: {}  │  Extraction: {}  │  Filter: {}",
        palette.paint(format!("{:?}", metrics.total), ansi::GREEN),
        palette.paint(format!("{:?}", metrics.extraction.duration), ansi::CYAN),
        palette.dim(format!("{:?}", metrics.filter.duration)),
    );
    let extraction = &metrics.extraction;
    println!(
        "  {} {}  {} {}  {} {}  {} {}",
        palette.dim("bytes:"),
        palette.paint(extraction.bytes_read.to_string(), ansi::BLUE),
        palette.dim("charset:"),
        palette.paint(extraction.encoding, ansi::BLUE),
        palette.dim("words:"),
        palette.paint(extraction.words.to_string(), ansi::BLUE),
        palette.dim("records:"),
        palette.paint(extraction.records.to_string(), ansi::BLUE),
    );
    println!(
        "  {} {}  {} {}  {} {}",
        palette.dim("kept:"),
        palette.paint(metrics.filter.kept.to_string(), ansi::YELLOW),
        palette.dim("pruned:"),
        palette.paint(metrics.filter.pruned.to_string(), ansi::YELLOW),
        palette.dim("long-tag drops:"),
        palette.paint(metrics.filter.dropped_long.to_string(), ansi::YELLOW),
    );
}
