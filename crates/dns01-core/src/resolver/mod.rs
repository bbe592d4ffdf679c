//! Zone resolution
//!
//! Providers search zones by substring, so a query for `example.com` can also
//! return `sub.example.com` or `myexample.com`. Only an exact name match is
//! accepted.

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::traits::{DnsProvider, Zone};

/// Find the zone named exactly `domain`
///
/// `domain` must not carry a trailing dot.
///
/// # Returns
///
/// - `Ok(Some(zone))`: The first candidate whose name equals `domain`
/// - `Ok(None)`: The search succeeded but no candidate matched exactly
/// - `Err(Error::ZoneLookup)`: The search call itself failed
///
/// If the provider returns several zones with the same exact name, the first
/// one wins and a warning is logged.
pub async fn find_zone(session: &dyn DnsProvider, domain: &str) -> Result<Option<Zone>> {
    info!("Looking for zone {}", domain);

    let zones = session
        .list_zones(domain)
        .await
        .map_err(|source| Error::ZoneLookup {
            zone: domain.to_string(),
            source,
        })?;

    let mut found: Option<Zone> = None;
    for zone in zones {
        if zone.name != domain {
            info!("Ignoring zone {}", zone.name);
            continue;
        }

        match found {
            None => {
                info!("Found existing zone {}", domain);
                found = Some(zone);
            }
            Some(ref first) => {
                warn!(
                    "Provider returned duplicate zone {} (id {}), keeping id {}",
                    domain, zone.id, first.id
                );
            }
        }
    }

    Ok(found)
}
