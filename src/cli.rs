use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pageflip")]
#[command(version)]
#[command(about = "Page through comic archives in natural page order", long_about = None)]
#[command(after_help = "Examples:\n  \
  pageflip issue1.cbz               read pages interactively (n, p, f, l, <page>, q)\n  \
  pageflip -l issue1.cbz            list pages in reading order\n  \
  pageflip -p 5 issue1.cbz > p5.jpg write page 5 to stdout\n  \
  pageflip -d out https://example.com/issue1.cbz   export all pages of a remote archive")]
pub struct Cli {
    /// Comic archive (CBZ/ZIP) path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// List pages in reading order
    #[arg(short = 'l')]
    pub list: bool,

    /// List pages verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Write page PAGE (1-based) to stdout
    #[arg(short = 'p', value_name = "PAGE", conflicts_with_all = ["list", "verbose", "export_dir"])]
    pub page: Option<String>,

    /// Export all pages in reading order into DIR
    #[arg(short = 'd', value_name = "DIR", conflicts_with_all = ["list", "verbose"])]
    pub export_dir: Option<String>,

    /// Overwrite existing files when exporting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        crate::io::is_http_url(&self.file)
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.page.is_some()
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        match self.quiet {
            0 => "warn",
            1 => "error",
            _ => "off",
        }
    }
}
