use colored::Colorize;

pub mod crawl;
pub mod report;

pub fn print_banner() {
    println!(
        "{}",
        r#"
 __      __
/  \    /  \ ____ _____ ___  __ ___________
\   \/\/   // __ \\__  \\  \/ // __ \_  __ \
 \        /\  ___/ / __ \\   /\  ___/|  | \/
  \__/\  /  \___  >____  /\_/  \___  >__|
       \/       \/     \/          \/
"#
        .bright_cyan()
        .bold()
    );
    println!(
        "  {} {}\n",
        "a bounded, breadth-first web crawler".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
