use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use draft_engine::analysis::recommender::BanMode;
use draft_engine::api::models::{AnalyzeRequest, BansRequest, RecommendRequest};
use draft_engine::display::output::{
    display_analysis, display_archetypes, display_bans, display_champion, display_error,
    display_info, display_recommendations, display_simulation, display_status, display_success,
};
use draft_engine::error::DraftError;
use draft_engine::{Config, DraftService, DraftState, Pick, Role, SlotRequest, Team};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "Draft Engine")]
#[command(about = "Archetype-based pick recommendations and win projections", long_about = None)]
struct Cli {
    /// Directory holding champions.json, models.json and matrix.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Default)]
struct DraftArgs {
    /// Draft state as JSON (overrides the inline flags below)
    #[arg(long)]
    draft: Option<PathBuf>,

    /// Blue picks, e.g. "Jinx:BOTTOM,Leona:UTILITY"
    #[arg(long, default_value = "")]
    blue: String,

    /// Red picks, e.g. "Caitlyn:BOTTOM,Thresh:UTILITY"
    #[arg(long, default_value = "")]
    red: String,

    /// Blue bans, comma separated
    #[arg(long, default_value = "")]
    blue_bans: String,

    /// Red bans, comma separated
    #[arg(long, default_value = "")]
    red_bans: String,

    /// Side on turn (default: blue)
    #[arg(long)]
    next: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank candidates for an open slot
    Recommend {
        #[command(flatten)]
        draft: DraftArgs,

        /// Team to recommend for (default: side on turn)
        #[arg(short, long)]
        team: Option<String>,

        /// Role to fill; omit for a flex slot
        #[arg(short, long)]
        role: Option<String>,

        /// Number of recommendations (default from DRAFT_DEFAULT_LIMIT)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Restrict candidates to these champions, comma separated
        #[arg(long)]
        pool: Option<String>,

        /// Show the full reasoning for the top pick
        #[arg(short, long)]
        verbose: bool,
    },
    /// Project a full 5v5 matchup
    Analyze {
        /// Blue roster, e.g. "Garen:TOP,Lee Sin:JUNGLE,..."
        #[arg(long)]
        blue: String,

        /// Red roster
        #[arg(long)]
        red: String,
    },
    /// Rank bans for a side
    Bans {
        #[command(flatten)]
        draft: DraftArgs,

        /// Banning team
        #[arg(short, long, default_value = "blue")]
        team: String,

        /// pro (draft-aware) or soloq (draft-blind)
        #[arg(short, long, default_value = "pro")]
        mode: String,

        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one champion's classification
    Champion { name: String },
    /// List the archetype catalog
    Archetypes,
    /// Simulate random legal drafts
    Simulate {
        #[arg(short, long, default_value = "1000")]
        games: usize,

        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Data and predictor health
    Status,
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("draft_engine=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Parses "Name:ROLE,Name:ROLE".
fn parse_picks(raw: &str) -> Result<Vec<Pick>, DraftError> {
    split_list(raw)
        .map(|entry| {
            let (name, role) = entry.rsplit_once(':').ok_or_else(|| {
                DraftError::InvalidDraft(format!("expected Name:ROLE, got {:?}", entry))
            })?;
            Ok(Pick::new(name.trim(), role.parse::<Role>()?))
        })
        .collect()
}

fn parse_bans(raw: &str) -> Vec<String> {
    split_list(raw).map(str::to_string).collect()
}

fn build_draft(args: &DraftArgs) -> anyhow::Result<DraftState> {
    if let Some(path) = &args.draft {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading draft file {}", path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("parsing draft file {}", path.display()));
    }

    let mut draft = DraftState::new();
    draft.blue.picks = parse_picks(&args.blue)?;
    draft.red.picks = parse_picks(&args.red)?;
    draft.blue.bans = parse_bans(&args.blue_bans);
    draft.red.bans = parse_bans(&args.red_bans);
    if let Some(next) = &args.next {
        draft.next_pick = next.parse::<Team>()?;
    }
    Ok(draft)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let service = DraftService::from_config(&config)
        .with_context(|| format!("loading data from {}", config.data_dir.display()))?;

    match cli.command {
        Command::Recommend {
            draft,
            team,
            role,
            limit,
            pool,
            verbose,
        } => {
            let draft = build_draft(&draft)?;
            let team = match team {
                Some(raw) => raw.parse::<Team>()?,
                None => draft.next_pick,
            };
            let role = role.map(|r| r.parse::<Role>()).transpose()?;
            let request = RecommendRequest {
                slots: vec![SlotRequest::new(team, role)],
                limit,
                candidate_pool: pool.map(|p| parse_bans(&p)),
                draft,
            };
            let response = service.recommend(&request)?;
            if cli.json {
                print_json(&response)?;
            } else {
                display_recommendations(&response, verbose);
            }
        }
        Command::Analyze { blue, red } => {
            let request = AnalyzeRequest {
                blue: parse_picks(&blue)?,
                red: parse_picks(&red)?,
            };
            let response = service.analyze(&request)?;
            if cli.json {
                print_json(&response)?;
            } else {
                display_analysis(&response);
            }
        }
        Command::Bans {
            draft,
            team,
            mode,
            limit,
        } => {
            let request = BansRequest {
                draft: build_draft(&draft)?,
                team: team.parse::<Team>()?,
                mode: mode.parse::<BanMode>()?,
                limit,
            };
            let response = service.bans(&request)?;
            if cli.json {
                print_json(&response)?;
            } else {
                display_bans(&response);
            }
        }
        Command::Champion { name } => {
            let response = service.champion(&name)?;
            if cli.json {
                print_json(&response)?;
            } else {
                display_champion(&response);
            }
        }
        Command::Archetypes => {
            let catalog = service.archetypes();
            if cli.json {
                print_json(&catalog)?;
            } else {
                display_archetypes(&catalog);
            }
        }
        Command::Simulate { games, seed } => {
            if !cli.json {
                display_info(&format!("Simulating {} drafts (seed {})", games, seed));
            }
            let pb = ProgressBar::new(games as u64);
            if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
                pb.set_style(style);
            }
            pb.set_message("Projecting drafts");
            let summary = service.simulate(games, seed, |done| pb.set_position(done as u64))?;
            pb.finish_with_message("✓ Simulation complete");

            if cli.json {
                print_json(&summary)?;
            } else {
                display_simulation(&summary);
                display_success("Summary saved to the simulation cache");
            }
        }
        Command::Status => {
            let status = service.status();
            if cli.json {
                print_json(&status)?;
            } else {
                display_status(&status);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_picks_parse_names_with_spaces_and_aliases() {
        let picks = parse_picks("Lee Sin:jg, Kai'Sa:ADC ,").unwrap();
        assert_eq!(picks, vec![Pick::new("Lee Sin", Role::Jungle), Pick::new("Kai'Sa", Role::Bottom)]);
    }

    #[test]
    fn inline_picks_reject_missing_role() {
        assert!(parse_picks("Jinx").is_err());
        assert!(parse_picks("Jinx:ROAM").is_err());
        assert!(parse_picks("").unwrap().is_empty());
    }
}
