use clap::{ArgAction, Parser, Subcommand};
use mass_production::{config, output, source};
use mass_production::press::{Press, RunSummary};
use mass_production::file::File;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mass-production")]
#[command(about = "Stamp post and archive pages from one template per content item")]
#[command(long_about = "\
Stamp post and archive pages from one template per content item

Every file under the source directory passes through unchanged, except the
templates themselves. Each content item (a markdown document or a
pre-supplied [post_params] entry) becomes one page stamped from the main
template. Each archive type gets one page per bucket its rule files posts
into. Generated files carry unrendered template source plus the data a
rendering stage needs, nested under the configured namespace.

Site layout:

  site/
  ├── mass-production.toml   # Config (template, archives, locals)
  ├── post.html              # Main template → one page per post
  ├── category.html          # Archive template → one page per bucket
  ├── posts/                 # Markdown content, front matter in --- or +++
  │   └── hello.md           # → hello/index.html
  └── about.html             # Passed through unchanged

Nothing is written to disk. Use 'plan' to preview the generated site and
'manifest' to hand it to a renderer as JSON.

Run 'mass-production gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Site source directory
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Config file [default: <source>/mass-production.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the files a run would produce
    Plan,
    /// Print every produced file with its data as JSON
    Manifest,
    /// Validate config, templates and content without printing output
    Check,
    /// Print a stock mass-production.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    mass_production::init_tracing(cli.verbose);

    match cli.command {
        Command::Plan => {
            let (files, press) = press_site(&cli.source, cli.config.as_deref())?;
            output::print_plan(&files, press.site_map().get());
        }
        Command::Manifest => {
            let (files, _) = press_site(&cli.source, cli.config.as_deref())?;
            output::print_manifest(&files)?;
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let (_, press) = press_site(&cli.source, cli.config.as_deref())?;
            let RunSummary {
                posts,
                archives,
                passed_through,
                ..
            } = press.summary().clone();
            println!(
                "{posts} posts, {archives} archive pages, {passed_through} pass-through files"
            );
            println!("==> Site is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load config, read the source tree and run one press over it.
fn press_site(
    source: &Path,
    config_path: Option<&Path>,
) -> Result<(Vec<File>, Press), Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| source.join(config::CONFIG_FILE));
    let site_config = config::load_config(&config_path)
        .map_err(|e| format!("{}: {e}", config_path.display()))?;
    let root = config_path.parent().unwrap_or(Path::new("."));

    let mut exclude = vec![config_path.clone()];
    exclude.extend(site_config.markdown_path(root));
    let input = source::read_tree(source, &exclude)?;

    let mut press = Press::new(site_config.into_options(root)?)?;
    let mut files = Vec::new();
    press.run(input, &mut files)?;
    Ok((files, press))
}
