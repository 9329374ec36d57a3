//! # Nametag CLI
//!
//! Command-line interface for batch badge rendering.
//!
//! ## Usage
//!
//! ```bash
//! # Render one PNG per name described by a job file
//! nametag render job.json --out badges/
//!
//! # Use extra font directories and a remote font service
//! nametag render job.json --out badges/ --font-dir ./fonts \
//!     --remote-fonts 'https://fonts.example.com/{family}.ttf'
//!
//! # Show which catalog fonts are installed
//! nametag fonts
//!
//! # Check specific families
//! nametag fonts --check "Lobster" --check "DejaVu Serif"
//!
//! # Show or replace the remembered names list
//! nametag names --state-dir ~/.nametag --set attendees.txt
//! ```

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use nametag::{
    FontRegistry, NametagError,
    batch::{self, GeneratedImage, UploadedImage},
    fonts::RegistryConfig,
    job::{self, Job},
    logging,
    document::TextArea,
    session::{SessionState, SessionStore},
};

/// Nametag - render a name into every text area of an image
#[derive(Parser, Debug)]
#[command(name = "nametag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log progress details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct FontArgs {
    /// Font directory to scan (repeatable; defaults to the system font directories)
    #[arg(long = "font-dir", value_name = "DIR")]
    font_dirs: Vec<PathBuf>,

    /// Font file used when a family cannot be resolved
    #[arg(long, value_name = "FILE")]
    fallback_font: Option<PathBuf>,

    /// Remote font URL template, e.g. https://fonts.example.com/{family}.ttf
    #[arg(long = "remote-fonts", value_name = "TEMPLATE")]
    remote_fonts: Option<String>,
}

impl FontArgs {
    fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            font_dirs: self.font_dirs.clone(),
            fallback_font: self.fallback_font.clone(),
            remote_url_template: self.remote_fonts.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one PNG per name from a job file
    Render {
        /// Job file (JSON)
        job: PathBuf,

        /// Output directory
        #[arg(long, short, value_name = "DIR")]
        out: PathBuf,

        #[command(flatten)]
        fonts: FontArgs,

        /// Remember names and the last text style here; names are read from
        /// it when the job has none
        #[arg(long, value_name = "DIR")]
        state_dir: Option<PathBuf>,
    },

    /// List catalog fonts and whether they resolve on this machine
    Fonts {
        #[command(flatten)]
        fonts: FontArgs,

        /// Family to check instead of the catalog (repeatable)
        #[arg(long, value_name = "FAMILY")]
        check: Vec<String>,
    },

    /// Show or replace the remembered names list
    Names {
        #[arg(long, value_name = "DIR")]
        state_dir: PathBuf,

        /// Replace the list with the lines of this file
        #[arg(long, value_name = "FILE")]
        set: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), NametagError> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Render {
            job,
            out,
            fonts,
            state_dir,
        } => render(&job, &out, &fonts, state_dir.as_deref()).await,
        Commands::Fonts { fonts, check } => list_fonts(&fonts, &check),
        Commands::Names { state_dir, set } => names(&state_dir, set.as_deref()),
    }
}

async fn render(
    job_path: &Path,
    out: &Path,
    font_args: &FontArgs,
    state_dir: Option<&Path>,
) -> Result<(), NametagError> {
    let job = Job::from_file(job_path)?;
    let registry = FontRegistry::from_config(&font_args.registry_config())?;
    for font in &job.fonts {
        let handle = registry.register_file(font)?;
        println!("Registered font {}", handle.family());
    }

    let store = state_dir.map(SessionStore::new);
    let mut names = job.load_names()?;
    if let (true, Some(store)) = (names.is_empty(), &store) {
        names = store.load()?.names;
    }

    let source = UploadedImage::from_bytes(&fs::read(&job.image)?)?;
    println!(
        "Rendering {} names into {} areas on {}x{} image...",
        names.len(),
        job.areas.len(),
        source.width,
        source.height
    );

    batch::preload_fonts(&registry, &job.areas).await;

    let mut report = |current: usize, total: usize| {
        eprint!("\r  {}/{}", current, total);
        let _ = std::io::stderr().flush();
    };
    let outputs =
        batch::generate(&source, &names, &job.areas, &registry, Some(&mut report)).await?;
    eprintln!();

    fs::create_dir_all(out)?;
    save_outputs(out, &outputs)?;
    println!("Saved {} images to {}", outputs.len(), out.display());

    if let Some(store) = &store {
        store.update(|state| remember_run(state, &names, &job.areas))?;
    }
    Ok(())
}

/// Record a finished run: the names exactly as given, blanks included, and
/// the style of the last area.
fn remember_run(state: &mut SessionState, names: &[String], areas: &[TextArea]) {
    state.names = names.to_vec();
    if let Some(area) = areas.last() {
        state.last_text_style = Some(area.style.clone());
    }
}

/// Write `<index>-<name>.png` for each output, numbered from 1.
fn save_outputs(out: &Path, outputs: &[GeneratedImage]) -> Result<(), NametagError> {
    let digits = outputs.len().to_string().len();
    for (i, output) in outputs.iter().enumerate() {
        let filename = format!("{:0digits$}-{}.png", i + 1, sanitize_filename(&output.name));
        fs::write(out.join(filename), &output.blob)?;
    }
    Ok(())
}

/// File-system-safe version of a name.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    if cleaned.is_empty() {
        "name".to_string()
    } else {
        cleaned
    }
}

fn list_fonts(font_args: &FontArgs, check: &[String]) -> Result<(), NametagError> {
    let registry = FontRegistry::from_config(&font_args.registry_config())?;
    let families: Vec<&str> = if check.is_empty() {
        FontRegistry::list_builtins().to_vec()
    } else {
        check.iter().map(String::as_str).collect()
    };

    let width = families.iter().map(|f| f.len()).max().unwrap_or(0);
    for family in families {
        let status = if registry.is_available(family) {
            "available"
        } else {
            "falls back"
        };
        println!("  {:width$}  {}", family, status);
    }
    Ok(())
}

fn names(state_dir: &Path, set: Option<&Path>) -> Result<(), NametagError> {
    let store = SessionStore::new(state_dir);
    let state = match set {
        Some(file) => {
            let names = job::read_names(file)?;
            store.update(|state| state.names = names)?
        }
        None => store.load()?,
    };

    for name in &state.names {
        println!("{}", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nametag::document::Rect;
    use nametag::style::TextStyle;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Mary-Anne O'Connor"), "Mary-Anne_OConnor");
        assert_eq!(sanitize_filename("../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename("???"), "name");
        assert_eq!(sanitize_filename("José"), "José");
    }

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::parse_from([
            "nametag",
            "render",
            "job.json",
            "--out",
            "out",
            "--font-dir",
            "a",
            "--font-dir",
            "b",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Render { job, fonts, .. } => {
                assert_eq!(job, PathBuf::from("job.json"));
                assert_eq!(fonts.font_dirs.len(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_run_keeps_names_as_given() {
        let names: Vec<String> = vec!["  Ada ".into(), "".into(), "Grace\t".into()];
        let style = TextStyle {
            font_family: "Georgia".into(),
            ..Default::default()
        };
        let rect = Rect::new(0.0, 0.0, 100.0, 40.0);
        let areas = vec![TextArea::commit("name", rect, style.clone()).unwrap()];

        let mut state = SessionState::default();
        remember_run(&mut state, &names, &areas);
        assert_eq!(state.names, names);
        assert_eq!(state.last_text_style, Some(style));

        remember_run(&mut state, &[], &[]);
        assert!(state.names.is_empty());
        assert!(state.last_text_style.is_some());
    }
}
