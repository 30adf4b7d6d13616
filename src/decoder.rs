use crate::config::DecoderConfig;
use crate::error::{FormatError, GeoError};
use crate::geo::{GeoLookup, GeoTable, Location, NoGeoLookup};
use crate::grammar::{self, EditFields};
use crate::models::{Dimension, Dimensions, FeedMessage, Row};
use crate::namespace::NamespaceTable;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns feed lines into rows.
///
/// Holds only read-only state, so one decoder can be shared by any number of
/// threads as long as its geo lookup is.
pub struct EditDecoder<G> {
    namespaces: Arc<NamespaceTable>,
    geo: G,
}

impl<G: GeoLookup> EditDecoder<G> {
    pub fn new(namespaces: Arc<NamespaceTable>, geo: G) -> Self {
        Self { namespaces, geo }
    }

    pub fn decode_message(&self, message: &FeedMessage) -> Result<Row, FormatError> {
        self.decode(message.timestamp, &message.channel, &message.text)
    }

    pub fn decode(
        &self,
        timestamp: DateTime<Utc>,
        channel: &str,
        text: &str,
    ) -> Result<Row, FormatError> {
        let fields = grammar::parse_edit(text)?;
        let delta = parse_delta(&fields)?;

        let mut dimensions = Dimensions::new();

        if let Some(language) = grammar::channel_language(channel) {
            dimensions.set(Dimension::Language, language);
        }

        dimensions.set(Dimension::Page, grammar::page_url(fields.page));

        let anonymous = grammar::looks_anonymous(fields.user);
        if anonymous {
            if let Some(location) = self.locate(fields.user) {
                set_location(&mut dimensions, location);
            }
        }
        dimensions.set(Dimension::User, fields.user);
        dimensions.set_flag(Dimension::Anonymous, anonymous);

        dimensions.set_flag(Dimension::Unpatrolled, fields.flags.contains('!'));
        dimensions.set_flag(Dimension::NewPage, fields.flags.contains('N'));
        dimensions.set_flag(Dimension::Robot, fields.flags.contains('B'));

        dimensions.set(Dimension::Namespace, self.namespaces.classify(fields.page));

        Ok(Row::new(timestamp, dimensions, delta as f32))
    }

    fn locate(&self, address: &str) -> Option<Location> {
        match self.geo.lookup(address) {
            Ok(location) => Some(location),
            Err(e @ (GeoError::MalformedAddress { .. } | GeoError::NotFound { .. })) => {
                debug!(address = address, error = %e, "Geo lookup failed");
                None
            }
            Err(e) => {
                warn!(address = address, error = %e, "Error looking up geo ip");
                None
            }
        }
    }
}

impl EditDecoder<Box<dyn GeoLookup>> {
    /// Builds a decoder from its JSON config, loading the geo table if one is named.
    pub fn from_config(config: DecoderConfig) -> Result<Self> {
        let geo: Box<dyn GeoLookup> = match &config.geo_db_file {
            Some(path) => Box::new(
                GeoTable::from_path(path)
                    .with_context(|| format!("Unable to open geo ip lookup database: {:?}", path))?,
            ),
            None => {
                info!("No geo database configured, anonymous edits will not be located");
                Box::new(NoGeoLookup)
            }
        };
        let namespaces = NamespaceTable::new(config.namespaces);
        info!(namespaces = namespaces.len(), "Edit decoder ready");
        Ok(Self::new(Arc::new(namespaces), geo))
    }
}

fn parse_delta(fields: &EditFields<'_>) -> Result<i64, FormatError> {
    match fields.delta {
        Some(raw) => raw.parse::<i64>().map_err(|_| FormatError::InvalidDelta {
            raw: raw.to_string(),
        }),
        None => Ok(0),
    }
}

fn set_location(dimensions: &mut Dimensions, location: Location) {
    let parts = [
        (Dimension::Continent, location.continent),
        (Dimension::Country, location.country),
        (Dimension::Region, location.region),
        (Dimension::City, location.city),
    ];
    for (dimension, value) in parts {
        if !value.is_empty() {
            dimensions.set(dimension, value);
        }
    }
}
