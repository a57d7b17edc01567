//! Device types and their required-field tables.
//!
//! Each device type owns an ordered table of required canonical field names
//! mapped to the canonical unit the field must be expressed in. The table
//! drives derivation of a record's `parsed` map from its raw `data` points.

use serde::{Deserialize, Serialize};

/// Enumeration of supported device types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    /// Unknown device, primarily virtual meters
    #[default]
    Unknown,
    /// Photovoltaic device
    Pv,
    /// Heating, ventilation, and cooling device
    Hvac,
    /// Solar thermal device
    SolarTherm,
    /// Wind based device
    Wind,
    /// Generic energy device
    Energy,
    /// Generic temperature device
    Temp,
}

impl DeviceType {
    /// Resolve a device-type tag to its variant.
    ///
    /// Returns `None` for unrecognized tags; callers decide whether that is
    /// a skip or a hard error.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "UNKNOWN" => Some(Self::Unknown),
            "PV" => Some(Self::Pv),
            "HVAC" => Some(Self::Hvac),
            "SOLAR_THERM" => Some(Self::SolarTherm),
            "WIND" => Some(Self::Wind),
            "ENERGY" => Some(Self::Energy),
            "TEMP" => Some(Self::Temp),
            _ => None,
        }
    }

    /// The tag string for this device type.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Pv => "PV",
            Self::Hvac => "HVAC",
            Self::SolarTherm => "SOLAR_THERM",
            Self::Wind => "WIND",
            Self::Energy => "ENERGY",
            Self::Temp => "TEMP",
        }
    }

    /// Required `(field, canonical unit)` pairs for this device type.
    ///
    /// An empty table means no enrichment is derived for the type.
    pub fn fields(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::SolarTherm => &[
                ("energy_rate", "btu / hour"),
                ("flow_rate", "gallon / minute"),
                ("supply_temp", "degF"),
                ("return_temp", "degF"),
                ("energy_total", "megabtu"),
            ],
            Self::Wind => &[
                ("inverter_real", "kilowatt"),
                ("inverter_energy_total", "kilowatthour"),
                ("rotor_speed", "rpm"),
                ("wind_speed", "mph"),
            ],
            Self::Unknown | Self::Pv | Self::Hvac | Self::Energy | Self::Temp => &[],
        }
    }

    /// Look up the required unit for a field, if the field is declared.
    pub fn required_unit(&self, field: &str) -> Option<&'static str> {
        self.fields()
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, unit)| *unit)
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trip() {
        for dt in [
            DeviceType::Unknown,
            DeviceType::Pv,
            DeviceType::Hvac,
            DeviceType::SolarTherm,
            DeviceType::Wind,
            DeviceType::Energy,
            DeviceType::Temp,
        ] {
            assert_eq!(DeviceType::from_tag(dt.tag()), Some(dt));
        }
    }

    #[test]
    fn unknown_tag_is_none() {
        assert_eq!(DeviceType::from_tag("TURBINE"), None);
        assert_eq!(DeviceType::from_tag(""), None);
    }

    #[test]
    fn wind_fields_are_ordered() {
        let fields = DeviceType::Wind.fields();
        assert_eq!(fields[0], ("inverter_real", "kilowatt"));
        assert_eq!(DeviceType::Wind.required_unit("rotor_speed"), Some("rpm"));
        assert_eq!(DeviceType::Wind.required_unit("bogus"), None);
    }

    #[test]
    fn serde_uses_tag_names() {
        let json = serde_json::to_string(&DeviceType::SolarTherm).unwrap();
        assert_eq!(json, "\"SOLAR_THERM\"");
        let back: DeviceType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DeviceType::SolarTherm);
    }
}
