use crate::infra::raffle_service;
use chrono::NaiveDateTime;
use clap::Args;
use salsa_raffle::config::AppConfig;
use salsa_raffle::error::AppError;
use salsa_raffle::telemetry;
use salsa_raffle::workflows::raffle::{
    parse_cutoff, write_attendance_csv, write_groups_csv, write_rosters_csv, MemberRegistry,
    PreviousCycle, RaffleRun, RaffleRunOptions, RaffleSummary, Role,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct AllocateArgs {
    /// Sign-up form export (CSV)
    #[arg(long)]
    pub(crate) registrations: PathBuf,
    /// groups.csv written by last cycle's raffle
    #[arg(long)]
    pub(crate) previous_groups: Option<PathBuf>,
    /// Members list (CSV with handle, approved and paid columns)
    #[arg(long)]
    pub(crate) members: Option<PathBuf>,
    /// Registrations submitted after this moment are late (overrides RAFFLE_CUTOFF)
    #[arg(long, value_parser = parse_cutoff)]
    pub(crate) cutoff: Option<NaiveDateTime>,
    /// Directory receiving groups.csv, rosters.csv and attendance.csv
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
    /// Print the full result as JSON instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_allocation(args: AllocateArgs) -> Result<(), AppError> {
    let AllocateArgs {
        registrations,
        previous_groups,
        members,
        cutoff,
        output_dir,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let service = raffle_service(&config.raffle)?;
    let previous = previous_groups
        .map(PreviousCycle::from_path)
        .transpose()?;
    let members = members.map(MemberRegistry::from_path).transpose()?;
    let options = RaffleRunOptions {
        cutoff: cutoff.or(config.raffle.cutoff),
        previous,
        members,
    };

    let run = service.run_path(&registrations, options)?;

    if let Some(dir) = output_dir {
        write_outputs(&dir, &run)?;
    }

    if json {
        let payload = serde_json::to_string_pretty(&run).map_err(std::io::Error::from)?;
        println!("{payload}");
    } else {
        render_run(&run);
    }

    Ok(())
}

fn write_outputs(dir: &Path, run: &RaffleRun) -> Result<(), AppError> {
    std::fs::create_dir_all(dir)?;

    let groups = dir.join("groups.csv");
    write_groups_csv(
        &run.registrants,
        &run.result,
        BufWriter::new(File::create(&groups)?),
    )?;

    let rosters = dir.join("rosters.csv");
    write_rosters_csv(&run.result, BufWriter::new(File::create(&rosters)?))?;

    let attendance = dir.join("attendance.csv");
    write_attendance_csv(&run.result, BufWriter::new(File::create(&attendance)?))?;

    info!(
        groups = %groups.display(),
        rosters = %rosters.display(),
        attendance = %attendance.display(),
        "raffle outputs written"
    );
    Ok(())
}

fn render_run(run: &RaffleRun) {
    let summary = &run.summary;

    println!("Raffle results");
    println!("\nLevels");
    for level in &summary.levels {
        println!(
            "- {} {}: {} leaders | {} followers | {} open seats (capacity {})",
            level.level,
            level.name,
            level.leaders,
            level.followers,
            level.open_seats(),
            level.capacity
        );
    }

    for role in Role::ordered() {
        let entries = run.result.waiting_list(role);
        if entries.is_empty() {
            println!("\n{} waiting list: empty", role.label());
            continue;
        }
        println!("\n{} waiting list", role.label());
        for entry in entries {
            println!(
                "  {}. {} ({}) | {}",
                entry.rank,
                entry.identity.handle,
                entry.identity.name,
                entry.band.label()
            );
        }
    }

    render_counts(summary);
}

fn render_counts(summary: &RaffleSummary) {
    println!("---");
    println!("Number of applicants:");
    println!("Total:   {}", summary.total);
    println!("Seated:  {}", summary.seated);
    println!("Waiting: {}", summary.waitlisted);
    for count in &summary.waiting_lists {
        println!(
            "  {}: {} waiting ({} from previous waiting list)",
            count.role_label, count.waiting, count.from_previous_waiting_list
        );
    }
    println!("---");
    println!("Accepted emails {}:", summary.accepted_emails.len());
    println!("{}", summary.accepted_emails.join(", "));
    println!("---");
    println!("Waiting list emails {}:", summary.waitlisted_emails.len());
    println!("{}", summary.waitlisted_emails.join(", "));
    println!("---");
}

#[cfg(test)]
mod tests {
    use super::*;
    use salsa_raffle::workflows::raffle::{LevelCatalog, RaffleService};

    #[test]
    fn writes_groups_rosters_and_attendance() {
        let csv = "Telegram handle,Dance role,First preference\n@ana,Leader,S1\n@cleo,Follower,S1\n";
        let service = RaffleService::new(LevelCatalog::standard(15).expect("catalog"));
        let run = service
            .run(csv.as_bytes(), RaffleRunOptions::default())
            .expect("raffle runs");
        let dir = std::env::temp_dir().join(format!("salsa-raffle-outputs-{}", std::process::id()));

        write_outputs(&dir, &run).expect("outputs written");

        let attendance = std::fs::read_to_string(dir.join("attendance.csv")).expect("attendance");
        assert!(attendance.starts_with("level,level_name,role,name,handle,member,paid,week_1"));
        assert_eq!(attendance.lines().count(), 3);
        assert!(dir.join("groups.csv").exists());
        assert!(dir.join("rosters.csv").exists());
        std::fs::remove_dir_all(&dir).expect("cleanup");
    }
}
