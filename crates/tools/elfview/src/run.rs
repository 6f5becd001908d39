//! Tool entry points: open the image, run the pipeline, emit the report.

use std::process::ExitCode;

use anyhow::{Context, Result};
use elfview_elf::{Inspection, RawImage, SymbolError, inspect, report};

use crate::cli::{CommonArgs, ReadElfCli, ReadSymtabCli};
use crate::config::Settings;
use crate::sink::{OutputStream, write_all};

/// Resolve settings, initialize logging, open and inspect the input.
fn load(args: &CommonArgs) -> Result<(Settings, Inspection)> {
    crate::logging::init(args.verbose, args.quiet);
    let settings = Settings::resolve(args)?;

    let image = RawImage::open(&settings.file, settings.read_mode)?;
    let inspection = inspect(image.as_bytes(), settings.labels)
        .with_context(|| format!("{}", settings.file.display()))?;
    tracing::debug!(
        sections = inspection.sections.len(),
        symbols = inspection.symbols.as_ref().map_or(0, Vec::len),
        "inspection complete"
    );
    Ok((settings, inspection))
}

/// Symbols to report, or `None` when the file has no symbol table.
fn symbols_or_note(
    settings: &Settings,
    symbols: &Result<Vec<elfview_elf::SymbolEntry>, SymbolError>,
) -> Result<Option<Vec<elfview_elf::SymbolEntry>>> {
    match symbols {
        Ok(symbols) => Ok(Some(symbols.clone())),
        Err(SymbolError::NoSymbolTable) => {
            tracing::info!(file = %settings.file.display(), "no symbol table");
            write_all(
                OutputStream::Stderr,
                b"Symbol table not found in the ELF file.\n",
            )?;
            Ok(None)
        }
        Err(e) => Err(anyhow::Error::new(*e))
            .with_context(|| format!("{}", settings.file.display())),
    }
}

/// `read-elf`: header report, optionally with sections and symbols.
///
/// Header and sections are written before a symbol table error is returned.
pub fn read_elf(cli: &ReadElfCli) -> Result<()> {
    let (settings, inspection) = load(&cli.common)?;

    let want_sections = cli.sections || cli.all;
    let want_symbols = cli.symbols || cli.all;

    let sections = want_sections.then_some(inspection.sections.as_slice());
    let (symbols, deferred) = if want_symbols {
        match symbols_or_note(&settings, &inspection.symbols) {
            Ok(symbols) => (symbols, None),
            Err(e) => (None, Some(e)),
        }
    } else {
        (None, None)
    };

    let text = report::render(&inspection.header, sections, symbols.as_deref());
    write_all(OutputStream::Stdout, text.as_bytes()).context("writing report")?;

    deferred.map_or(Ok(()), Err)
}

/// `read-symtab`: symbol table report.
pub fn read_symtab(cli: &ReadSymtabCli) -> Result<()> {
    let (settings, inspection) = load(&cli.common)?;

    let Some(symbols) = symbols_or_note(&settings, &inspection.symbols)? else {
        return Ok(());
    };

    let mut text = String::new();
    report::render_symbols(&mut text, &symbols).context("formatting symbol table")?;
    write_all(OutputStream::Stdout, text.as_bytes()).context("writing report")?;
    Ok(())
}

/// Map a run result to the process exit status, printing a one-line
/// diagnostic for errors.
#[must_use]
pub fn exit_with(tool: &str, result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let line = format!("{tool}: error: {e:#}\n");
            // Nothing sensible to do if stderr itself is gone.
            let _ = write_all(OutputStream::Stderr, line.as_bytes());
            ExitCode::FAILURE
        }
    }
}
