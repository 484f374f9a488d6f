//! Command line record parsing
//!
//! ```text
//! recupdaterd -k <APIKey> -d <domain> <subdomain1> [<subdomain2> ...] [-d ...] [-k ...]
//! ```
//!
//! `-k` switches the API key and forgets the current domain, `-d` switches
//! the domain under the current key. Every run of subdomains after a `-d`
//! becomes one record. Specifiers are case-insensitive.

use recupdater_core::DomainRecord;
use thiserror::Error;

/// One-line usage shown with every argument error
pub const USAGE: &str = "Syntax: recupdaterd -k <APIKey> -d <domain> <subdomain1> <...>";

/// Smallest valid command line: `-k K -d D sub`
const MIN_ARGS: usize = 5;

/// Errors in the record arguments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordArgsError {
    #[error("Not enough arguments!")]
    NotEnoughArguments,

    #[error("Unknown specifier '{0}'!")]
    UnknownSpecifier(String),

    #[error("No API key and/or domain specified!")]
    MissingKeyOrDomain,

    #[error("No subdomains given for domain '{0}'!")]
    DomainWithoutSubdomains(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Specifier {
    Key,
    Domain,
}

impl Specifier {
    fn parse(arg: &str) -> Result<Self, RecordArgsError> {
        match arg {
            "-k" | "-K" => Ok(Self::Key),
            "-d" | "-D" => Ok(Self::Domain),
            _ => Err(RecordArgsError::UnknownSpecifier(arg.to_string())),
        }
    }
}

/// Record being collected
#[derive(Default)]
struct Pending {
    api_key: Option<String>,
    domain: Option<String>,
    subdomains: Vec<String>,
}

impl Pending {
    /// Turn the collected subdomains into a record, if a domain is open
    fn flush(&mut self, records: &mut Vec<DomainRecord>) -> Result<(), RecordArgsError> {
        let Some(domain) = self.domain.take() else {
            return Ok(());
        };
        if self.subdomains.is_empty() {
            return Err(RecordArgsError::DomainWithoutSubdomains(domain));
        }
        // A domain is only ever opened under a key
        let api_key = self.api_key.clone().unwrap_or_default();
        records.push(DomainRecord::new(
            api_key,
            domain,
            std::mem::take(&mut self.subdomains),
        ));
        Ok(())
    }
}

/// Parse the arguments following the program name into records
pub fn parse_records<S: AsRef<str>>(args: &[S]) -> Result<Vec<DomainRecord>, RecordArgsError> {
    if args.len() < MIN_ARGS {
        return Err(RecordArgsError::NotEnoughArguments);
    }

    let mut records = Vec::new();
    let mut pending = Pending::default();
    let mut i = 0;

    while i < args.len() {
        let arg = args[i].as_ref();

        if arg.starts_with('-') {
            let specifier = Specifier::parse(arg)?;
            // The value must be followed by at least one more argument
            if i + 2 >= args.len() {
                return Err(RecordArgsError::NotEnoughArguments);
            }
            let value = args[i + 1].as_ref().to_string();

            pending.flush(&mut records)?;
            match specifier {
                Specifier::Key => pending.api_key = Some(value),
                Specifier::Domain => pending.domain = Some(value),
            }
            i += 2;
            continue;
        }

        if pending.api_key.is_none() || pending.domain.is_none() {
            return Err(RecordArgsError::MissingKeyOrDomain);
        }
        pending.subdomains.push(arg.to_string());
        i += 1;
    }

    pending.flush(&mut records)?;

    if records.is_empty() {
        return Err(RecordArgsError::NotEnoughArguments);
    }
    Ok(records)
}
