//! CLI subcommands
//!
//! Thin handlers over the [`App`](crate::app::App) mutation entry points.
//! Command output goes to stdout; diagnostics go to the tracing log.

use clap::Subcommand;
use color_eyre::eyre::{WrapErr, bail, eyre};
use jiff::civil::Date;

use perktrack_core::model::{
    Benefit, BenefitKind, Card, Frequency, MinimumSpend, ResetType, SpendCadence, SpendFrequency,
};

use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show cards, remaining value, and upcoming expirations
    Status {
        /// Override the configured expiring-soon window, in days
        #[arg(long)]
        days: Option<i32>,
    },
    /// List overdue benefits awaiting a manual reset decision
    Pending,
    /// Accept pending manual resets (all, or specific benefits)
    Accept {
        /// Accept every pending reset
        #[arg(long)]
        all: bool,
        /// Benefit ids (or id prefixes) to accept
        benefits: Vec<String>,
    },
    /// Decline the pending manual resets, preserving their data
    Decline,
    /// Add a card
    AddCard {
        name: String,
        /// Card anniversary (YYYY-MM-DD; month/day are what matter)
        #[arg(value_parser = parse_date)]
        anniversary: Date,
    },
    /// Add a benefit to a card
    AddBenefit {
        card: String,
        description: String,
        #[arg(long)]
        amount: f64,
        /// monthly, quarterly, biannual, annual, every-4-years,
        /// one-time, or carryover
        #[arg(long)]
        frequency: String,
        /// calendar or anniversary (recurring benefits only)
        #[arg(long, default_value = "calendar")]
        reset_type: String,
        /// Expiry date for one-time benefits
        #[arg(long, value_parser = parse_date)]
        expires: Option<Date>,
    },
    /// Add a minimum-spend requirement to a card
    AddSpend {
        card: String,
        description: String,
        #[arg(long)]
        target: f64,
        /// monthly, quarterly, biannual, or yearly; omit for one-time
        #[arg(long)]
        frequency: Option<String>,
        #[arg(long, default_value = "calendar")]
        reset_type: String,
        /// Deadline for one-time requirements
        #[arg(long, value_parser = parse_date)]
        deadline: Option<Date>,
    },
    /// Record how much of a benefit has been used
    Use {
        card: String,
        benefit: String,
        amount: f64,
    },
    /// Earn this year's instance of a carryover benefit
    Earn { card: String, benefit: String },
    /// Add progress toward a minimum spend
    Spend {
        card: String,
        spend: String,
        amount: f64,
    },
    /// Set a benefit's period policy: auto-claim, ignore, or none
    SetPolicy {
        card: String,
        benefit: String,
        /// auto-claim, ignore, or none
        policy: String,
        /// Optional end date for the policy
        #[arg(long, value_parser = parse_date)]
        until: Option<Date>,
    },
}

fn parse_date(s: &str) -> Result<Date, String> {
    s.parse().map_err(|e| format!("invalid date {s:?}: {e}"))
}

fn parse_reset_type(s: &str) -> color_eyre::Result<ResetType> {
    match s {
        "calendar" => Ok(ResetType::Calendar),
        "anniversary" => Ok(ResetType::Anniversary),
        other => bail!("unknown reset type {other:?} (expected calendar or anniversary)"),
    }
}

fn parse_benefit_kind(
    frequency: &str,
    reset_type: &str,
    expires: Option<Date>,
    today: Date,
) -> color_eyre::Result<BenefitKind> {
    let recurring = |frequency| -> color_eyre::Result<BenefitKind> {
        Ok(BenefitKind::Recurring {
            frequency,
            reset_type: parse_reset_type(reset_type)?,
            last_reset: today,
        })
    };
    match frequency {
        "monthly" => recurring(Frequency::Monthly),
        "quarterly" => recurring(Frequency::Quarterly),
        "biannual" => recurring(Frequency::Biannual),
        "annual" => recurring(Frequency::Annual),
        "every-4-years" => recurring(Frequency::EveryFourYears),
        "one-time" => Ok(BenefitKind::OneTime {
            expiry_date: expires,
        }),
        "carryover" => Ok(BenefitKind::Carryover { instances: vec![] }),
        other => bail!("unknown frequency {other:?}"),
    }
}

fn parse_spend_frequency(s: &str) -> color_eyre::Result<SpendFrequency> {
    match s {
        "monthly" => Ok(SpendFrequency::Monthly),
        "quarterly" => Ok(SpendFrequency::Quarterly),
        "biannual" => Ok(SpendFrequency::Biannual),
        "yearly" | "annual" => Ok(SpendFrequency::Yearly),
        other => bail!("unknown spend frequency {other:?}"),
    }
}

fn resolve_card<'a>(app: &'a App, needle: &str) -> color_eyre::Result<&'a Card> {
    app.resolve_card(needle)
        .ok_or_else(|| eyre!("no card matching {needle:?}"))
}

fn resolve_benefit<'a>(card: &'a Card, needle: &str) -> color_eyre::Result<&'a Benefit> {
    card.benefits
        .iter()
        .find(|b| b.id.as_str() == needle || b.description == needle)
        .or_else(|| {
            card.benefits
                .iter()
                .find(|b| b.id.as_str().starts_with(needle))
        })
        .ok_or_else(|| eyre!("no benefit matching {needle:?} on {}", card.name))
}

fn resolve_spend<'a>(card: &'a Card, needle: &str) -> color_eyre::Result<&'a MinimumSpend> {
    card.minimum_spends
        .iter()
        .find(|m| m.id.as_str() == needle || m.description == needle)
        .or_else(|| {
            card.minimum_spends
                .iter()
                .find(|m| m.id.as_str().starts_with(needle))
        })
        .ok_or_else(|| eyre!("no minimum spend matching {needle:?} on {}", card.name))
}

pub fn run(app: &mut App, command: Command, today: Date) -> color_eyre::Result<()> {
    match command {
        Command::Status { days } => {
            let window = days.unwrap_or(app.config.expiring_window_days);
            print_status(app, today, window);
        }

        Command::Pending => {
            if app.pending.is_empty() {
                println!("Nothing pending.");
            }
            for p in &app.pending {
                println!(
                    "{}  {}  ${:.2} unclaimed since {}",
                    p.benefit_id, p.description, p.unclaimed_amount, p.boundary
                );
            }
        }

        Command::Accept { all, benefits } => {
            let accepted: Vec<_> = app
                .pending
                .iter()
                .filter(|p| {
                    all || benefits
                        .iter()
                        .any(|n| p.benefit_id.as_str().starts_with(n.as_str()))
                })
                .map(|p| (p.card_id.clone(), p.benefit_id.clone()))
                .collect();
            if accepted.is_empty() {
                bail!("nothing matched; use --all or pass benefit ids");
            }
            let count = app.accept_pending(&accepted, today)?;
            println!("Reset {count} benefit(s).");
        }

        Command::Decline => {
            app.decline_pending();
            println!("Left as-is. They will be surfaced again next time.");
        }

        Command::AddCard { name, anniversary } => {
            let id = app.add_card(name, anniversary);
            app.save()?;
            println!("Added card {id}.");
        }

        Command::AddBenefit {
            card,
            description,
            amount,
            frequency,
            reset_type,
            expires,
        } => {
            let card_id = resolve_card(app, &card)?.id.clone();
            let kind = parse_benefit_kind(&frequency, &reset_type, expires, today)?;
            let id = app.add_benefit(&card_id, description, amount, kind)?;
            app.save()?;
            println!("Added benefit {id}.");
        }

        Command::AddSpend {
            card,
            description,
            target,
            frequency,
            reset_type,
            deadline,
        } => {
            let card_id = resolve_card(app, &card)?.id.clone();
            let cadence = match frequency {
                Some(f) => SpendCadence::Recurring {
                    frequency: parse_spend_frequency(&f)?,
                    reset_type: parse_reset_type(&reset_type)?,
                    last_reset: today,
                },
                None => SpendCadence::OneTime { deadline },
            };
            let id = app.add_minimum_spend(&card_id, description, target, cadence)?;
            app.save()?;
            println!("Added minimum spend {id}.");
        }

        Command::Use {
            card,
            benefit,
            amount,
        } => {
            let card_ref = resolve_card(app, &card)?;
            let card_id = card_ref.id.clone();
            let benefit_id = resolve_benefit(card_ref, &benefit)?.id.clone();
            let clamped = app.set_used_amount(&card_id, &benefit_id, amount)?;
            app.save()?;
            println!("Used ${clamped:.2}.");
        }

        Command::Earn { card, benefit } => {
            let card_ref = resolve_card(app, &card)?;
            let card_id = card_ref.id.clone();
            let benefit_id = resolve_benefit(card_ref, &benefit)?.id.clone();
            if app.earn_instance(&card_id, &benefit_id, today)? {
                app.save()?;
                println!("Earned this year's instance.");
            } else {
                println!("Not earnable: already earned this year, or gated by a minimum spend.");
            }
        }

        Command::Spend {
            card,
            spend,
            amount,
        } => {
            let card_ref = resolve_card(app, &card)?;
            let card_id = card_ref.id.clone();
            let spend_id = resolve_spend(card_ref, &spend)?.id.clone();
            let current = app.add_spend_progress(&card_id, &spend_id, amount, today)?;
            app.save()?;
            let spend = app
                .card(&card_id)?
                .minimum_spend(&spend_id)
                .expect("just updated");
            if spend.is_met {
                println!("${current:.2} — met!");
            } else {
                println!("${current:.2} — ${:.2} to go.", spend.remaining_amount());
            }
        }

        Command::SetPolicy {
            card,
            benefit,
            policy,
            until,
        } => {
            let card_ref = resolve_card(app, &card)?;
            let card_id = card_ref.id.clone();
            let benefit_id = resolve_benefit(card_ref, &benefit)?.id.clone();
            match policy.as_str() {
                "auto-claim" => app.set_auto_claim(&card_id, &benefit_id, true, until)?,
                "ignore" => app.set_ignored(&card_id, &benefit_id, true, until)?,
                "none" => {
                    app.set_auto_claim(&card_id, &benefit_id, false, None)?;
                    app.set_ignored(&card_id, &benefit_id, false, None)?;
                }
                other => bail!("unknown policy {other:?} (expected auto-claim, ignore, or none)"),
            }
            app.save().wrap_err("failed to persist policy change")?;
            println!("Policy updated.");
        }
    }
    Ok(())
}

fn print_status(app: &App, today: Date, window: i32) {
    if app.cards.is_empty() {
        println!("No cards yet. Add one with `perktrack add-card`.");
        return;
    }

    for card in &app.cards {
        println!(
            "{}  (${:.2} available)",
            card.name,
            card.total_remaining_value(today)
        );

        for benefit in &card.benefits {
            let locked = if card.is_benefit_unlocked(benefit) {
                ""
            } else {
                "  [locked]"
            };
            println!(
                "  {}  ${:.2} of ${:.2} left{}",
                benefit.description,
                benefit.remaining_value(today),
                benefit.total_amount,
                locked
            );
        }

        let due = card.benefits_needing_reset(today);
        if !due.is_empty() {
            println!("  {} benefit(s) due for reset — see `perktrack pending`", due.len());
        }

        for benefit in card.benefits_expiring_within(today, window) {
            if let Some(cycle) = benefit.expiry_cycle(card.anniversary_date) {
                println!(
                    "  ⏳ {} resets in {} day(s)",
                    benefit.description,
                    cycle.days_until_reset(today)
                );
            } else if let Some(cycle) = benefit.carryover_cycle()
                && let Some(days) = cycle.days_until_earliest_expiry(today)
            {
                println!(
                    "  ⏳ {} instance expires in {} day(s)",
                    benefit.description, days
                );
            } else if let BenefitKind::OneTime {
                expiry_date: Some(expiry),
            } = &benefit.kind
            {
                println!("  ⏳ {} expires {}", benefit.description, expiry);
            }
        }

        for spend in &card.minimum_spends {
            let state = if spend.is_met { "met" } else { "in progress" };
            let deadline = spend
                .cycle(card.anniversary_date)
                .deadline(today)
                .map(|d| format!(", due {d}"))
                .unwrap_or_default();
            println!(
                "  spend: {}  ${:.2} / ${:.2} ({state}{deadline})",
                spend.description, spend.current_amount, spend.target_amount
            );
        }

        for benefit in &card.benefits {
            for reminder in benefit.due_reminders(today) {
                println!(
                    "  🔔 {}: {} (${:.2})",
                    benefit.description, reminder.note, reminder.amount
                );
            }
        }
    }

    if !app.pending.is_empty() {
        println!(
            "\n{} reset decision(s) waiting — `perktrack pending`",
            app.pending.len()
        );
    }
}
