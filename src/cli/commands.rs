//! CLI command implementations
//!
//! Every command wires a [`FileDocumentStore`] and a [`LocalBlobStore`]
//! into a [`BackupService`] and delegates. Results are printed as pretty
//! JSON so output is scriptable.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::blob::LocalBlobStore;
use crate::document::FileDocumentStore;
use crate::http_server::{BackupState, HttpServer, HttpServerConfig};
use crate::scheduler::{AutoBackupScheduler, FileScheduleStore};
use crate::service::{BackupService, RestoreOptions};

use super::args::Command;
use super::errors::{CliError, CliResult};

fn build_service(data_dir: &Path, blob_root: &Path) -> Arc<BackupService> {
    let documents = Arc::new(FileDocumentStore::new(data_dir));
    let blobs = Arc::new(LocalBlobStore::new(blob_root.to_path_buf()));
    Arc::new(BackupService::new(documents, blobs))
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CliError::Io(e.to_string()))?;
    println!("{json}");
    Ok(())
}

/// Dispatch one parsed command.
pub fn dispatch(command: Command) -> CliResult<()> {
    match command {
        Command::Export {
            data_dir,
            out,
            description,
        } => export(&data_dir, &out, description),
        Command::Backup {
            data_dir,
            blob_root,
            description,
        } => backup(&data_dir, &blob_root, description),
        Command::List { blob_root } => list(&blob_root),
        Command::Details { blob_root, name } => details(&blob_root, &name),
        Command::Delete { blob_root, name } => delete(&blob_root, &name),
        Command::Restore {
            data_dir,
            blob_root,
            name,
            delete_existing,
            collections,
        } => restore(&data_dir, &blob_root, &name, delete_existing, collections),
        Command::Serve {
            data_dir,
            blob_root,
            schedule_file,
            host,
            port,
        } => serve(&data_dir, &blob_root, &schedule_file, host, port),
    }
}

fn export(data_dir: &Path, out: &Path, description: Option<String>) -> CliResult<()> {
    // The blob store is unused here; point it at the data dir.
    let service = build_service(data_dir, data_dir);
    let snapshot = service.export_snapshot(description)?;
    let json = snapshot.to_json().map_err(|e| CliError::Io(e.to_string()))?;
    fs::write(out, json).map_err(|e| CliError::Io(e.to_string()))?;

    println!(
        "exported {} documents to {}",
        snapshot.metadata.total_documents,
        out.display()
    );
    Ok(())
}

fn backup(data_dir: &Path, blob_root: &Path, description: Option<String>) -> CliResult<()> {
    let service = build_service(data_dir, blob_root);
    let descriptor = service.backup_to_cloud(description)?;
    print_json(&descriptor)
}

fn list(blob_root: &Path) -> CliResult<()> {
    let service = build_service(blob_root, blob_root);
    let backups = service.list_backups()?;
    print_json(&backups)
}

fn details(blob_root: &Path, name: &str) -> CliResult<()> {
    let service = build_service(blob_root, blob_root);
    let details = service.backup_details(name)?;
    print_json(&details)
}

fn delete(blob_root: &Path, name: &str) -> CliResult<()> {
    let service = build_service(blob_root, blob_root);
    service.delete_backup(name)?;
    println!("deleted {name}");
    Ok(())
}

fn restore(
    data_dir: &Path,
    blob_root: &Path,
    name: &str,
    delete_existing: bool,
    collections: Option<Vec<String>>,
) -> CliResult<()> {
    let service = build_service(data_dir, blob_root);
    let options = RestoreOptions {
        delete_existing_data: delete_existing,
        collections: collections.map(|names| names.into_iter().collect::<BTreeSet<_>>()),
        ..Default::default()
    };
    let report = service.restore(name, &options)?;
    print_json(&report)
}

fn serve(
    data_dir: &Path,
    blob_root: &Path,
    schedule_file: &PathBuf,
    host: String,
    port: u16,
) -> CliResult<()> {
    let service = build_service(data_dir, blob_root);

    let state = Arc::new(BackupState {
        service: service.clone(),
        schedule_store: FileScheduleStore::new(schedule_file),
    });
    let config = HttpServerConfig {
        host,
        port,
        ..Default::default()
    };
    let server = HttpServer::new(config, state);
    let scheduler = AutoBackupScheduler::new(service, FileScheduleStore::new(schedule_file));

    let runtime = tokio::runtime::Runtime::new().map_err(|e| CliError::Server(e.to_string()))?;
    runtime.block_on(async {
        tokio::spawn(scheduler.run());
        server
            .serve()
            .await
            .map_err(|e| CliError::Server(e.to_string()))
    })
}
