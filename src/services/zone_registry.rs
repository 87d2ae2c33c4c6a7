//! Immutable, ordered set of risk zones
//!
//! Declaration order is significant: when zones overlap, the one declared
//! first wins both the alert and the active-icon selection.

use crate::domain::error::ConfigError;
use crate::domain::types::{Coordinate, Zone, ZoneId};
use crate::infra::config::{Config, ZoneConfig};

#[derive(Debug, Clone)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
}

impl ZoneRegistry {
    /// Build a registry from zone entries sharing one radius
    ///
    /// Zone IDs are assigned from declaration order.
    pub fn new(radius_m: f64, entries: &[ZoneConfig]) -> Result<Self, ConfigError> {
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(ConfigError::InvalidRadius(radius_m));
        }

        let zones = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let center = Coordinate::new(entry.lat, entry.lon);
                if !center.is_valid() {
                    return Err(ConfigError::InvalidZoneCenter {
                        index,
                        label: entry.label.clone(),
                        lat: entry.lat,
                        lon: entry.lon,
                    });
                }
                Ok(Zone {
                    id: zone_id(index)?,
                    center,
                    label: entry.label.clone(),
                    color: entry.color,
                    icon: entry.icon().to_string(),
                    radius_m,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { zones })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(config.radius_m(), config.zones())
    }

    /// Zones in declaration order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Zone id for a declaration index
fn zone_id(index: usize) -> Result<ZoneId, ConfigError> {
    u32::try_from(index).map(ZoneId).map_err(|_| ConfigError::TooManyZones(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ZoneColor;

    fn entry(lat: f64, lon: f64, label: &str) -> ZoneConfig {
        ZoneConfig { lat, lon, label: label.to_string(), color: ZoneColor::Red, icon: None }
    }

    #[test]
    fn test_ids_follow_declaration_order() {
        let registry = ZoneRegistry::new(
            100.0,
            &[entry(40.90, 31.17, "A"), entry(40.91, 31.18, "B"), entry(40.92, 31.19, "C")],
        )
        .unwrap();

        let labels: Vec<&str> = registry.zones().iter().map(|z| z.label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "C"]);
        for (i, zone) in registry.zones().iter().enumerate() {
            assert_eq!(zone.id, ZoneId(i as u32));
            assert_eq!(zone.radius_m, 100.0);
        }
        assert_eq!(registry.get(ZoneId(1)).map(|z| z.label.as_str()), Some("B"));
        assert!(registry.get(ZoneId(3)).is_none());
    }

    #[test]
    fn test_shared_center_gets_distinct_ids() {
        let registry =
            ZoneRegistry::new(250.0, &[entry(40.90, 31.17, "A"), entry(40.90, 31.17, "B")])
                .unwrap();
        assert_eq!(registry.len(), 2);
        assert_ne!(registry.zones()[0].id, registry.zones()[1].id);
    }

    #[test]
    fn test_rejects_bad_radius() {
        assert_eq!(
            ZoneRegistry::new(0.0, &[]).unwrap_err(),
            ConfigError::InvalidRadius(0.0)
        );
        assert!(ZoneRegistry::new(-5.0, &[]).is_err());
        assert!(ZoneRegistry::new(f64::NAN, &[]).is_err());
    }

    #[test]
    fn test_rejects_bad_center() {
        let err = ZoneRegistry::new(250.0, &[entry(40.0, 31.0, "ok"), entry(95.0, 31.0, "bad")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidZoneCenter { index: 1, .. }));
    }

    #[test]
    fn test_from_default_config() {
        let registry = ZoneRegistry::from_config(&Config::default()).unwrap();
        assert_eq!(registry.len(), 6);
        assert!(!registry.is_empty());
        assert_eq!(registry.zones()[5].icon, "Fazla Riskli");
    }

    #[test]
    fn test_zone_id_from_index() {
        assert_eq!(zone_id(0), Ok(ZoneId(0)));
        assert_eq!(zone_id(u32::MAX as usize), Ok(ZoneId(u32::MAX)));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_zone_id_overflow_is_rejected() {
        let index = u32::MAX as usize + 1;
        assert_eq!(zone_id(index), Err(ConfigError::TooManyZones(index)));
    }
}
