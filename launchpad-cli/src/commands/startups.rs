//! Startups command - startups, analyses and follow-up questions.

use anyhow::Result;
use clap::{Args, Subcommand};
use launchpad_core::NewStartup;
use tracing::info;

use super::{json, queries, text};
use crate::{Cli, OutputFormat};

/// Arguments for the startups command.
#[derive(Args, Default)]
pub struct StartupsArgs {
    /// Action to run. Lists startups when omitted.
    #[command(subcommand)]
    pub action: Option<StartupsAction>,
}

/// Startups subcommands.
#[derive(Subcommand)]
pub enum StartupsAction {
    /// List startups.
    List,

    /// Show one startup.
    Show {
        /// Startup id.
        id: String,
    },

    /// Create a startup.
    Create {
        /// Startup name.
        name: String,

        /// Short description.
        #[arg(long, short)]
        description: Option<String>,

        /// Industry.
        #[arg(long, short)]
        industry: Option<String>,

        /// Funding stage.
        #[arg(long, short)]
        stage: Option<String>,
    },

    /// Delete a startup.
    Delete {
        /// Startup id.
        id: String,
    },

    /// List the analyses of a startup.
    Analyses {
        /// Startup id.
        id: String,
    },

    /// Run an analysis of a startup.
    Analyze {
        /// Startup id.
        id: String,
    },

    /// List the follow-up questions of a startup.
    Questions {
        /// Startup id.
        id: String,
    },

    /// Answer a follow-up question.
    Answer {
        /// Startup id.
        startup_id: String,

        /// Question id.
        question_id: String,

        /// Answer text.
        answer: String,
    },
}

/// Runs the startups command.
pub async fn run(args: &StartupsArgs, cli: &Cli) -> Result<()> {
    let queries = queries(cli).await?;
    let text = text(cli);
    let json = json(cli);

    let default = StartupsAction::List;
    let output = match args.action.as_ref().unwrap_or(&default) {
        StartupsAction::List => {
            let startups = queries.startups().await?;
            match cli.format {
                OutputFormat::Text => text.format_startups(&startups),
                OutputFormat::Json => json.format(&*startups)?,
            }
        }
        StartupsAction::Show { id } => {
            let startup = queries.startup(id).await?;
            match cli.format {
                OutputFormat::Text => text.format_startup(&startup),
                OutputFormat::Json => json.format(&*startup)?,
            }
        }
        StartupsAction::Create {
            name,
            description,
            industry,
            stage,
        } => {
            let new = NewStartup {
                name: name.clone(),
                description: description.clone(),
                industry: industry.clone(),
                stage: stage.clone(),
            };
            let startup = queries.create_startup(&new).await?;
            info!(id = %startup.id, "Startup created");
            match cli.format {
                OutputFormat::Text => format!("Created: {} ({})", startup.name, startup.id),
                OutputFormat::Json => json.format(&startup)?,
            }
        }
        StartupsAction::Delete { id } => {
            queries.delete_startup(id).await?;
            info!(id = %id, "Startup deleted");
            match cli.format {
                OutputFormat::Text => format!("Deleted: {id}"),
                OutputFormat::Json => json.format(&serde_json::json!({ "deleted": id }))?,
            }
        }
        StartupsAction::Analyses { id } => {
            let analyses = queries.analyses(id).await?;
            match cli.format {
                OutputFormat::Text => text.format_analyses(&analyses),
                OutputFormat::Json => json.format(&*analyses)?,
            }
        }
        StartupsAction::Analyze { id } => {
            let analysis = queries.run_analysis(id).await?;
            match cli.format {
                OutputFormat::Text => text.format_analyses(std::slice::from_ref(&analysis)),
                OutputFormat::Json => json.format(&analysis)?,
            }
        }
        StartupsAction::Questions { id } => {
            let questions = queries.questions(id).await?;
            match cli.format {
                OutputFormat::Text => text.format_questions(&questions),
                OutputFormat::Json => json.format(&*questions)?,
            }
        }
        StartupsAction::Answer {
            startup_id,
            question_id,
            answer,
        } => {
            let question = queries
                .answer_question(startup_id, question_id, answer)
                .await?;
            match cli.format {
                OutputFormat::Text => text.format_questions(std::slice::from_ref(&question)),
                OutputFormat::Json => json.format(&question)?,
            }
        }
    };

    println!("{output}");
    Ok(())
}
