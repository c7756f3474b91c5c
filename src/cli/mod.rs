pub mod seed;

use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::config;
use crate::services::{ActivityStatsService, ActivitySummaryService, SummaryGroupBy, SummaryPeriod};

#[derive(Parser)]
#[command(name = "kudos-backend", about = "Multi-tenant activity tracking backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run pending database migrations
    Migrate,
    /// Seed a demo dataset (companies, users, sample activities)
    Seed,
    /// Print a company's activity summary as JSON
    Summary {
        /// Company name
        #[arg(long)]
        company: String,
        /// Window keyword: hour, day, week or month
        #[arg(long, default_value = "day")]
        period: String,
        /// Grouping: activity_type, user, hour or total
        #[arg(long, default_value = "activity_type")]
        group_by: String,
    },
    /// Print a company's dashboard stats as JSON
    Stats {
        /// Company name
        #[arg(long)]
        company: String,
    },
}

pub async fn run(cli: Cli, db: DatabaseConnection) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Migrate => {
            config::database::migrate(&db).await?;
            println!("Migrations complete");
        }
        Command::Seed => {
            config::database::migrate(&db).await?;
            let app_data = AppData::init(db);
            seed::run(&app_data).await?;
        }
        Command::Summary {
            company,
            period,
            group_by,
        } => {
            let app_data = AppData::init(db);
            let company = find_company(&app_data, &company).await?;
            let service = ActivitySummaryService::new(app_data.activity_store.clone());
            let report = service
                .generate(
                    &company,
                    SummaryPeriod::parse(&period),
                    SummaryGroupBy::parse(&group_by),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Stats { company } => {
            let app_data = AppData::init(db);
            let company = find_company(&app_data, &company).await?;
            let service = ActivityStatsService::new(
                app_data.user_store.clone(),
                app_data.activity_store.clone(),
            );
            let report = service.generate(&company).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

async fn find_company(
    app_data: &AppData,
    name: &str,
) -> Result<crate::types::db::company::Model, Box<dyn std::error::Error>> {
    app_data
        .company_store
        .find_by_name(name)
        .await?
        .ok_or_else(|| format!("company not found: {name}").into())
}
