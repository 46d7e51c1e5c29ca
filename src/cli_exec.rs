use std::io;

use anyhow::{Context, Result};

use xsec::config::Config;
use xsec::error::XsecError;
use xsec::model::{XsecRecord, fmt_ts_ui, fmt_value};
use xsec::notify::{NotifiedEntry, Notification, Notifier, SendmailNotifier};
use xsec::review::{ScriptedDisplay, SessionRunner, TerminalDisplay};
use xsec::store::{ListedRow, XsecStore};

use crate::Commands;

pub(crate) fn handle_command(cfg: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            let energies = XsecStore::init(&cfg.database)?;
            let list = energies
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "Initialized cross section tables ({} TeV) at {}",
                list,
                cfg.database.display()
            );
        }

        Commands::Get {
            samples,
            uncertainty,
            json,
        } => {
            let store = XsecStore::open(&cfg.database, cfg.energy)?;
            let records = store.get_xsec(&samples)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&records).context("serialize cross sections")?
                );
            } else {
                for r in records {
                    match (uncertainty, r.uncertainty) {
                        (true, Some(u)) => {
                            println!("{} {}", fmt_value(r.cross_section), fmt_value(u))
                        }
                        _ => println!("{}", fmt_value(r.cross_section)),
                    }
                }
            }
        }

        Commands::List { history, patterns } => {
            let store = XsecStore::open(&cfg.database, cfg.energy)?;
            let rows = store.list(&patterns, history)?;
            if rows.is_empty() {
                println!("No samples found.");
            }
            for row in &rows {
                println!("{}", list_line(row));
            }
        }

        Commands::Put {
            comments,
            uncertainties,
            source,
            pairs,
        } => {
            let records = parse_pairs(&pairs, &uncertainties)?;
            let store = XsecStore::open(&cfg.database, cfg.energy)?;
            let report = store.put_xsec(&records, &source, &comments)?;

            let mut n = Notification::new(cfg.energy, &source, &comments);
            for r in &records {
                let updated = report.is_update(&r.sample);
                println!(
                    "{} {} ---> {}",
                    if updated { "UPDATED" } else { "NEW    " },
                    r.sample,
                    fmt_value(r.cross_section)
                );
                n.entries.push(NotifiedEntry {
                    sample: r.sample.clone(),
                    value: r.cross_section,
                    updated,
                });
            }
            SendmailNotifier::new(&cfg.notify).notify(&n);
        }

        Commands::Revert {
            like,
            answers,
            samples,
        } => {
            let store = XsecStore::open(&cfg.database, cfg.energy)?;
            let notifier = SendmailNotifier::new(&cfg.notify);
            let runner = SessionRunner::new(&store, &notifier, cfg.energy);

            let keys = runner.resolve_keys(&samples, like)?;
            let history = runner.load_history(&keys)?;

            let mut stdout = io::stdout();
            let summary = match answers {
                Some(answers) => runner.run(
                    &history,
                    || ScriptedDisplay::from_answers(&answers),
                    &mut stdout,
                )?,
                None => runner.run(&history, TerminalDisplay::acquire, &mut stdout)?,
            };
            summary.into_result()?;
        }
    }

    Ok(())
}

fn list_line(row: &ListedRow) -> String {
    let uncertainty = row.uncertainty.map(fmt_value).unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "{:<8}{}  {} +- {}  {}  {}",
        if row.updated { "UPDATED" } else { "" },
        row.sample,
        fmt_value(row.cross_section),
        uncertainty,
        fmt_ts_ui(row.last_updated),
        row.source
    );
    if !row.comments.is_empty() {
        line.push_str(&format!("  ({})", row.comments));
    }
    line
}

/// Pairs `SAMPLE XSEC` arguments with the optional uncertainties.
fn parse_pairs(pairs: &[String], uncertainties: &[f64]) -> Result<Vec<XsecRecord>> {
    if pairs.len() % 2 != 0 {
        return Err(XsecError::BadInput(
            "Samples and cross sections are different length lists.".to_string(),
        )
        .into());
    }
    let n = pairs.len() / 2;
    if !uncertainties.is_empty() && uncertainties.len() != n {
        return Err(XsecError::BadInput(format!(
            "Got {} uncertainties for {} samples",
            uncertainties.len(),
            n
        ))
        .into());
    }

    pairs
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| {
            let cross_section: f64 = pair[1]
                .parse()
                .with_context(|| format!("parse cross section {:?} for {}", pair[1], pair[0]))?;
            Ok(XsecRecord {
                sample: pair[0].clone(),
                cross_section,
                uncertainty: uncertainties.get(i).copied(),
            })
        })
        .collect()
}
