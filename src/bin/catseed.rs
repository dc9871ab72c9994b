use anyhow::{bail, Context, Result};
use catalogue_seed::catalogue::{asset, vaccine};
use catalogue_seed::db::Db;
use catalogue_seed::identity::IdentityStore;
use catalogue_seed::output::{apply_records, write_sql_file};
use catalogue_seed::pipeline;
use catalogue_seed::statement::RecordStatements;
use catalogue_seed::util::env as env_util;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "catseed", version, about = "Catalogue seeding CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Import a vaccine catalogue CSV: items, variants, packaging, diluents,
    /// bundles, with paired changelog entries
    Vaccines {
        /// Source CSV file
        #[arg(long)]
        input: PathBuf,
        /// Persisted key->id map; do not share one file between concurrent runs
        #[arg(long)]
        id_map: PathBuf,
        /// Write generated SQL to this file instead of executing
        #[arg(long)]
        out: Option<PathBuf>,
        /// Database DSN (falls back to DATABASE_URL)
        #[arg(long)]
        db_url: Option<String>,
        /// Log intended writes without committing
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Also add each item to this master list
        #[arg(long)]
        master_list_id: Option<String>,
    },
    /// Import an asset catalogue CSV: class/category/type hierarchy plus
    /// catalogue items
    Assets {
        /// Source CSV file
        #[arg(long)]
        input: PathBuf,
        /// Persisted key->id map; do not share one file between concurrent runs
        #[arg(long)]
        id_map: PathBuf,
        /// Write generated SQL to this file instead of executing
        #[arg(long)]
        out: Option<PathBuf>,
        /// Database DSN (falls back to DATABASE_URL)
        #[arg(long)]
        db_url: Option<String>,
        /// Log intended writes without committing
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Sub-catalogue name stamped on each catalogue item
        #[arg(long, default_value = "General")]
        sub_catalogue: String,
    },
    /// Assign existing assets to store locations (direct database only)
    AssetLocations {
        /// Source CSV file (AssetNumber, LocationCode[, LocationName])
        #[arg(long)]
        input: PathBuf,
        /// Persisted key->id map; do not share one file between concurrent runs
        #[arg(long)]
        id_map: PathBuf,
        #[arg(long, default_value = "localhost")]
        host: String,
        #[arg(long, default_value_t = 5432)]
        port: u16,
        #[arg(long)]
        database: String,
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        password: String,
        /// Store whose assets and locations are being linked
        #[arg(long)]
        store_id: String,
        /// Perform all reads and log intended writes without committing
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    catalogue_seed::logging::init_tracing("info,sqlx=warn")?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Vaccines {
            input,
            id_map,
            out,
            db_url,
            dry_run,
            master_list_id,
        } => {
            let rows = vaccine::read_rows(&input)?;
            info!(rows = rows.len(), input = %input.display(), "vaccine catalogue loaded");

            let mut ids = IdentityStore::load(&id_map)?;
            let emission = pipeline::vaccine::emit(&rows, &mut ids, master_list_id.as_deref())?;
            let s = &emission.summary;
            info!(
                items = s.items,
                variants = s.variants,
                packaging = s.packaging_variants,
                diluent_items = s.diluent_items,
                diluent_variants = s.diluent_variants,
                diluent_packaging = s.diluent_packaging_variants,
                bundles = s.bundles,
                master_list_lines = s.master_list_lines,
                "vaccine pipeline emitted"
            );

            deliver(&emission.records, out, db_url, dry_run).await?;
            if !dry_run {
                // Saved only after the run completed, never mid-run.
                ids.save(&id_map)?;
            }
        }
        Commands::Assets {
            input,
            id_map,
            out,
            db_url,
            dry_run,
            sub_catalogue,
        } => {
            let rows = asset::read_rows(&input)?;
            info!(rows = rows.len(), input = %input.display(), "asset catalogue loaded");

            let mut ids = IdentityStore::load(&id_map)?;
            let emission = pipeline::asset::emit(&rows, &mut ids, &sub_catalogue)?;
            let s = &emission.summary;
            info!(
                classes = s.classes,
                categories = s.categories,
                types = s.types,
                catalogue_items = s.catalogue_items,
                "asset pipeline emitted"
            );

            deliver(&emission.records, out, db_url, dry_run).await?;
            if !dry_run {
                ids.save(&id_map)?;
            }
        }
        Commands::AssetLocations {
            input,
            id_map,
            host,
            port,
            database,
            username,
            password,
            store_id,
            dry_run,
        } => {
            let rows = asset::read_location_rows(&input)?;
            info!(rows = rows.len(), input = %input.display(), "asset location rows loaded");

            let db = Db::connect_parts(&host, port, &database, &username, &password, 5).await?;
            let mut ids = IdentityStore::load(&id_map)?;
            let summary =
                pipeline::asset_locations::assign(&db, &rows, &mut ids, &store_id, dry_run).await?;
            if !dry_run {
                ids.save(&id_map)?;
            }
            info!(
                linked = summary.linked,
                skipped = summary.skipped_missing_asset,
                failed = summary.failed,
                "done"
            );
        }
    }
    Ok(())
}

/// Route emitted records to the requested output: a SQL file, or direct
/// execution against the database. Exactly one target must be chosen.
async fn deliver(
    records: &[RecordStatements],
    out: Option<PathBuf>,
    db_url: Option<String>,
    dry_run: bool,
) -> Result<()> {
    match out {
        Some(path) => {
            if dry_run {
                info!(statements = records.len(), "dry-run: skipping sql file write");
                return Ok(());
            }
            write_sql_file(&path, records)
        }
        None => {
            let url = env_util::db_url(db_url.as_deref())
                .context("choose an output: --out <file> or --db-url/DATABASE_URL")?;
            if url.trim().is_empty() {
                bail!("database URL resolved empty");
            }
            let db = Db::connect(&url, 5).await?;
            let summary = apply_records(&db, records, dry_run).await?;
            if summary.failed > 0 && summary.inserted == 0 && summary.noop == 0 {
                bail!("every record failed to apply; see warnings above");
            }
            Ok(())
        }
    }
}
