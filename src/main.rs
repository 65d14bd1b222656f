use clap::Parser;
use color_eyre::Result;
use taskplan::{Config, Database, Profile, cli::{self, Cli, Commands}, logging};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let args = Cli::parse();

    // --dev flag enables dev mode, otherwise use prod
    let profile = if args.dev { Profile::Dev } else { Profile::Prod };

    let config = match args.config.as_deref() {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_with_profile(profile)?,
    };

    logging::init_tracing(&config.log_level);

    // A store that cannot be opened is fatal
    let mut db = Database::open(config.get_database_path())?;

    match args.command.unwrap_or(Commands::Today { json: false }) {
        Commands::Init => cli::handle_init(&db),
        Commands::AddTask { title, description, deadline, priority } => {
            cli::handle_add_task(title, description, deadline, priority, &db)?;
        }
        Commands::Tasks { priority, search, all, json } => {
            cli::handle_tasks(priority, search, all, json, &db)?;
        }
        Commands::Complete { id, undo } => cli::handle_complete(id, undo, &db)?,
        Commands::DeleteTask { id } => cli::handle_delete_task(id, &db)?,
        Commands::Today { json } => cli::handle_today(json, &db)?,
        Commands::Day { date } => cli::handle_day(date, &db)?,
        Commands::Calendar { month } => cli::handle_calendar(month, &db)?,
        Commands::AddPlan { name, date } => cli::handle_add_plan(name, date, &config, &db)?,
        Commands::Plans { date } => cli::handle_plans(date, &db)?,
        Commands::Plan { id } => cli::handle_plan(id, &db)?,
        Commands::DeletePlan { id, cascade } => cli::handle_delete_plan(id, cascade, &db)?,
        Commands::AddItem { plan_id, title, description, priority, duration } => {
            cli::handle_add_item(plan_id, title, description, priority, duration, &db)?;
        }
        Commands::CompleteItem { id, undo } => cli::handle_complete_item(id, undo, &db)?,
        Commands::FromTemplate { template_id, date, name } => {
            cli::handle_from_template(template_id, date, name, &config, &db)?;
        }
        Commands::SaveTemplate { plan_id, name } => cli::handle_save_template(plan_id, name, &config, &db)?,
        Commands::Templates => cli::handle_templates(&db),
        Commands::DeleteTemplate { id } => cli::handle_delete_template(id, &db)?,
        Commands::Backup { path } => cli::handle_backup(path, &db)?,
        Commands::Restore { path, legacy } => cli::handle_restore(path, legacy, &config, &mut db)?,
        Commands::Export { path } => cli::handle_export(path, &db)?,
        Commands::Import { path } => cli::handle_import(path, &db)?,
    }

    db.close()?;
    Ok(())
}
