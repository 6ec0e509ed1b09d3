use crate::analysis::simulation::SimulationSummary;
use crate::api::models::{
    AnalyzeResponse, ArchetypeCatalog, BansResponse, ChampionResponse, RecommendResponse,
    StatusResponse, TeamAnalysis, WinProjectionSummary,
};
use crate::draft::Team;
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct RecommendationRow {
    rank: String,
    champion: String,
    role: String,
    archetype: String,
    score: String,
    synergy: String,
    counter: String,
    fit: String,
    #[tabled(rename = "win %")]
    win_rate: String,
}

#[derive(Tabled)]
struct BanRow {
    rank: String,
    champion: String,
    archetype: String,
    roles: String,
    score: String,
    reason: String,
}

#[derive(Tabled)]
struct ModelRow {
    model: String,
    #[tabled(rename = "blue %")]
    blue: String,
    weight: String,
}

#[derive(Tabled)]
struct MembershipRow {
    archetype: String,
    membership: String,
}

#[derive(Tabled)]
struct ArchetypeRow {
    #[tabled(rename = "#")]
    priority: String,
    archetype: String,
    family: String,
    champions: String,
    description: String,
}

#[derive(Tabled)]
struct MatchupRow {
    matchup: String,
    games: String,
    win_rate: String,
}

fn team_colored(team: Team) -> ColoredString {
    match team {
        Team::Blue => "BLUE".blue().bold(),
        Team::Red => "RED".red().bold(),
    }
}

fn header(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
}

fn display_projection(projection: &WinProjectionSummary) {
    println!(
        "{} {} {:.1}% / {} {:.1}%  (favored: {}, confidence {:.1}%)",
        "Win projection:".bold(),
        "Blue".blue(),
        projection.blue * 100.0,
        "Red".red(),
        projection.red * 100.0,
        team_colored(projection.favored),
        projection.confidence * 100.0
    );
    if projection.degraded {
        println!("  {} reduced confidence", "⚠️".yellow());
    }
    for note in &projection.notes {
        println!("  • {}", note);
    }
}

pub fn display_recommendations(response: &RecommendResponse, verbose: bool) {
    for slot in &response.slots {
        header(&format!("🎯 Recommendations for {}", slot.slot_id));

        if slot.recommendations.is_empty() {
            println!("{}", "No legal candidates remain for this slot".yellow());
            continue;
        }

        let mut rows = vec![];
        for (idx, rec) in slot.recommendations.iter().enumerate() {
            let b = &rec.score_breakdown;
            rows.push(RecommendationRow {
                rank: format!("#{}", idx + 1),
                champion: rec.champion.clone(),
                role: rec.role.to_string(),
                archetype: rec.archetype.label(),
                score: format!("{:.3}", rec.score),
                synergy: format!("{:+.2}", b.synergy),
                counter: format!("{:+.2}", b.counter),
                fit: format!("{:.1}", b.role_fit),
                win_rate: rec
                    .projected_team_winrate
                    .map(|p| format!("{:.1}%", p * 100.0))
                    .unwrap_or_else(|| "-".to_string()),
            });
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", table);

        if let Some(top) = slot.recommendations.first() {
            println!("\n{} {}", "Top pick:".bold().green(), top.champion.bold());
            let shown = if verbose { top.reasoning.len() } else { 3 };
            for line in top.reasoning.iter().take(shown) {
                println!("  • {}", line);
            }
            if !top.rationale_tags.is_empty() {
                println!("  {} {}", "tags:".dimmed(), top.rationale_tags.join(", "));
            }
        }
    }

    let analysis = &response.draft_analysis;
    println!();
    if !analysis.needs.missing_roles.is_empty() {
        println!(
            "{} {}",
            "Missing:".bold().yellow(),
            analysis.needs.missing_roles.join(", ")
        );
    }
    if !analysis.needs.threats.is_empty() {
        println!("{} {}", "Threats:".bold().red(), analysis.needs.threats.join(", "));
    }

    if let Some(projection) = &response.win_projection {
        display_projection(projection);
    }
    for note in &response.notes {
        display_warning(note);
    }
    println!();
}

fn display_team(label: ColoredString, team: &TeamAnalysis) {
    let picks = team
        .champions
        .iter()
        .zip(&team.archetypes)
        .map(|(pick, archetype)| format!("{} ({}, {})", pick.champion, pick.role, archetype.label()))
        .collect::<Vec<_>>()
        .join(", ");
    println!(
        "{} [{}] synergy {:+.2}\n  {}",
        label,
        team.composition_type.to_string().bold(),
        team.synergy_score,
        picks
    );
}

pub fn display_analysis(response: &AnalyzeResponse) {
    header("📊 MATCH ANALYSIS");

    let prediction = &response.prediction;
    println!(
        "{} {} ({:.1}% confidence)",
        "Predicted winner:".bold(),
        team_colored(prediction.winner),
        prediction.confidence * 100.0
    );
    println!(
        "Blue {:.1}% / Red {:.1}%\n",
        prediction.blue_win_probability * 100.0,
        prediction.red_win_probability * 100.0
    );

    let rows: Vec<ModelRow> = prediction
        .model_breakdown
        .iter()
        .map(|m| ModelRow {
            model: m.model.clone(),
            blue: format!("{:.1}%", m.blue_probability * 100.0),
            weight: format!("{:.3}", m.weight),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);

    display_team("Blue".blue().bold(), &response.blue);
    display_team("Red".red().bold(), &response.red);

    println!("\n{}", "Insights".bold().yellow());
    for insight in &response.insights {
        println!("• {}", insight);
    }
    if prediction.degraded {
        println!("\n{}", "Data quality".bold().red());
        for note in response.notes.iter().skip(1) {
            println!("  {} {}", "⚠️".yellow(), note);
        }
    }
    println!();
}

pub fn display_bans(response: &BansResponse) {
    header(&format!("🚫 Ban Recommendations for {}", response.team));

    let context = &response.context;
    println!("{} {} / {:?}", "Mode:".bold(), context.mode, context.phase);
    if let (Some(target), Some(theme)) = (context.target_team, context.target_theme) {
        println!("{} {} ({})", "Target:".bold(), target, theme);
    }
    if let Some(theme) = context.our_theme {
        println!("{} {}", "Our plan:".bold(), theme);
    }
    println!();

    if response.bans.is_empty() {
        println!("{}", "No ban candidates remain".yellow());
        return;
    }

    let rows: Vec<BanRow> = response
        .bans
        .iter()
        .enumerate()
        .map(|(idx, ban)| BanRow {
            rank: format!("#{}", idx + 1),
            champion: ban.champion.clone(),
            archetype: ban.archetype.label(),
            roles: ban
                .roles
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join("/"),
            score: format!("{:.2}", ban.score),
            reason: ban.reason.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    println!("\n{}", "Interpretation".bold().yellow());
    println!("• Score: 0.5 × opponent synergy + 0.3 × counter vs your picks + 0.2 × flexibility");
    println!("• Higher = more dangerous in the opponent's hands\n");
}

pub fn display_champion(champion: &ChampionResponse) {
    header(&format!("🔎 {}", champion.name));

    println!(
        "{} {} ({:?})",
        "Primary archetype:".bold(),
        champion.primary_archetype.label().green(),
        champion.archetype_source
    );
    if !champion.secondary_archetypes.is_empty() {
        let secondary: Vec<String> =
            champion.secondary_archetypes.iter().map(|a| a.label()).collect();
        println!("{} {}", "Secondary:".bold(), secondary.join(", "));
    }
    let roles: Vec<String> = champion.viable_roles.iter().map(|r| r.to_string()).collect();
    println!("{} {}", "Positions:".bold(), roles.join(", "));
    println!("{} {:?}", "Data quality:".bold(), champion.data_quality);
    if champion.reduced_confidence {
        println!("  {} reduced confidence", "⚠️".yellow());
    }
    if !champion.tags.is_empty() {
        println!("{} {}", "Tags:".bold(), champion.tags.join(", "));
    }

    let mut memberships: Vec<(&String, &f64)> = champion.membership.iter().collect();
    memberships.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let rows: Vec<MembershipRow> = memberships
        .into_iter()
        .filter(|(_, score)| **score > 0.0)
        .map(|(archetype, score)| MembershipRow {
            archetype: archetype.replace('_', " "),
            membership: format!("{:.2}", score),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("\n{}\n", table);
}

pub fn display_archetypes(catalog: &ArchetypeCatalog) {
    header("📚 ARCHETYPE CATALOG");

    let rows: Vec<ArchetypeRow> = catalog
        .archetypes
        .iter()
        .map(|info| ArchetypeRow {
            priority: format!("{}", info.priority + 1),
            archetype: info.label.clone(),
            family: info.family.label(),
            champions: format!("{}", info.champions.len()),
            description: info.description.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    println!(
        "\nSecondary archetypes need membership ≥ {:.2}; ties resolve by the order above.\n",
        catalog.secondary_threshold
    );
}

pub fn display_simulation(summary: &SimulationSummary) {
    header(&format!("🎲 SIMULATION ({} games, seed {})", summary.games, summary.seed));

    println!(
        "{} {:.1}%   {} {:.1}%   {} {:.1}%\n",
        "Blue win rate:".bold(),
        summary.blue_win_rate() * 100.0,
        "Avg blue prob:".bold(),
        summary.average_blue_probability * 100.0,
        "Avg confidence:".bold(),
        summary.average_confidence * 100.0
    );

    let mut matchups: Vec<(&String, &crate::analysis::simulation::WinRecord)> =
        summary.matchups.iter().collect();
    matchups.sort_by(|a, b| b.1.games.cmp(&a.1.games).then_with(|| a.0.cmp(b.0)));
    let rows: Vec<MatchupRow> = matchups
        .into_iter()
        .take(15)
        .map(|(name, record)| MatchupRow {
            matchup: name.clone(),
            games: format!("{}", record.games),
            win_rate: format!("{:.1}%", record.win_rate() * 100.0),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

pub fn display_status(status: &StatusResponse) {
    header("🩺 ENGINE STATUS");

    println!("{} {}", "Data directory:".bold(), status.data_dir);
    println!(
        "{} {} ({} complete, {} partial, {} missing)",
        "Champions:".bold(),
        status.champions,
        status.complete,
        status.partial,
        status.missing
    );
    if status.predictor_ready {
        println!(
            "{} {} over {} features",
            "Predictor:".bold(),
            status.models.join(", ").green(),
            status.feature_count
        );
    } else {
        println!(
            "{} {}",
            "Predictor:".bold(),
            status
                .predictor_reason
                .as_deref()
                .unwrap_or("unavailable")
                .red()
        );
    }
    println!("{} {}", "Matrix overrides:".bold(), status.matrix_overrides);
    if let Some(issue) = &status.matrix_issue {
        println!("  {} {}", "⚠️".yellow(), issue);
    }
    println!("{} {}", "Loaded at:".bold(), status.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(sim) = &status.last_simulation {
        println!(
            "{} {} games (seed {}), blue {:.1}% at {}",
            "Last simulation:".bold(),
            sim.games,
            sim.seed,
            sim.blue_win_rate * 100.0,
            sim.generated_at.format("%Y-%m-%d %H:%M")
        );
        if sim.stale {
            println!("  {} summary is stale; rerun `simulate` to refresh", "⚠️".yellow());
        }
    }
    println!();
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}
