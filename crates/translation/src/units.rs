//! Canonical unit registry.
//!
//! Every unit is an entry in one flat table: a dimension, a linear factor to
//! the dimension's base unit, and an affine offset (temperatures only).
//! Conversion is `base = value * factor + offset` within one dimension;
//! cross-dimension conversion is an error.
//!
//! Lookup ignores whitespace, so `btu / hour` and `btu/hour` name the same
//! entry.

use std::collections::HashMap;

use contracts::CollectorError;

/// The canonical unit of unitless readings.
pub const DIMENSIONLESS: &str = "dimensionless";

/// Physical dimension of a unit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Dimension {
    Energy,
    Power,
    Voltage,
    Current,
    Frequency,
    Resistance,
    Mass,
    MassFlow,
    Volume,
    VolumeFlow,
    Velocity,
    Temperature,
    Angle,
    Irradiance,
    Time,
    Pressure,
    Dimensionless,
}

#[derive(Debug, Clone, Copy)]
struct UnitDef {
    dimension: Dimension,
    /// Multiplier to the dimension base unit
    factor: f64,
    /// Affine offset to the dimension base unit (temperatures)
    offset: f64,
}

/// Registry of canonical units with dimension-checked conversion.
pub struct UnitRegistry {
    /// Whitespace-stripped canonical name -> definition
    units: HashMap<&'static str, UnitDef>,
    /// Vendor unit label -> whitespace-stripped canonical name
    vendor: HashMap<&'static str, &'static str>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            units: HashMap::new(),
            vendor: HashMap::new(),
        };
        registry.register_units();
        registry.register_vendor_labels();
        registry
    }

    /// Whether `unit` names a registered canonical unit.
    pub fn knows(&self, unit: &str) -> bool {
        self.units.contains_key(Self::normalize(unit).as_str())
    }

    /// Resolve a vendor unit label to its canonical unit name.
    ///
    /// Unknown or deliberately unmapped labels (counts, percentages) resolve
    /// to [`DIMENSIONLESS`].
    pub fn canonical(&self, vendor_label: &str) -> &'static str {
        match self.vendor.get(vendor_label) {
            Some(name) if !name.is_empty() => name,
            _ => DIMENSIONLESS,
        }
    }

    /// Convert `value` from one canonical unit to another.
    ///
    /// # Errors
    /// - [`CollectorError::UnknownUnit`] when either unit is unregistered
    /// - [`CollectorError::Conversion`] when the dimensions differ
    pub fn convert(&self, value: f64, from: &str, to: &str) -> Result<f64, CollectorError> {
        let from_def = self.lookup(from)?;
        let to_def = self.lookup(to)?;

        if from_def.dimension != to_def.dimension {
            return Err(CollectorError::conversion(from, to));
        }

        let base = value * from_def.factor + from_def.offset;
        Ok((base - to_def.offset) / to_def.factor)
    }

    fn lookup(&self, unit: &str) -> Result<UnitDef, CollectorError> {
        self.units
            .get(Self::normalize(unit).as_str())
            .copied()
            .ok_or_else(|| CollectorError::unknown_unit(unit))
    }

    fn normalize(unit: &str) -> String {
        unit.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn define(&mut self, name: &'static str, dimension: Dimension, factor: f64) {
        self.define_affine(name, dimension, factor, 0.0);
    }

    fn define_affine(
        &mut self,
        name: &'static str,
        dimension: Dimension,
        factor: f64,
        offset: f64,
    ) {
        debug_assert!(
            !name.chars().any(char::is_whitespace),
            "canonical names are registered whitespace-free"
        );
        self.units.insert(
            name,
            UnitDef {
                dimension,
                factor,
                offset,
            },
        );
    }

    #[rustfmt::skip]
    fn register_units(&mut self) {
        use Dimension::*;

        // energy, base joule
        self.define("watthour", Energy, 3_600.0);
        self.define("kilowatthour", Energy, 3.6e6);
        self.define("megawatthour", Energy, 3.6e9);
        self.define("volt_ampere*hour", Energy, 3_600.0);
        self.define("kilovolt_ampere*hour", Energy, 3.6e6);
        self.define("megavolt_ampere*hour", Energy, 3.6e9);
        self.define("btu", Energy, 1_055.056);
        self.define("kilobtu", Energy, 1.055056e6);
        self.define("megabtu", Energy, 1.055056e9);
        self.define("thm", Energy, 1.055056e8);
        // refrigeration ton-hour, 12000 btu
        self.define("ton*hour", Energy, 1.2660672e7);

        // power, base watt
        self.define("watt", Power, 1.0);
        self.define("milliwatt", Power, 1e-3);
        self.define("kilowatt", Power, 1e3);
        self.define("megawatt", Power, 1e6);
        self.define("volt_ampere", Power, 1.0);
        self.define("kilovolt_ampere", Power, 1e3);
        self.define("megavolt_ampere", Power, 1e6);
        self.define("btu/hour", Power, 1_055.056 / 3_600.0);

        // voltage, base volt
        self.define("volt", Voltage, 1.0);
        self.define("millivolt", Voltage, 1e-3);
        self.define("kilovolt", Voltage, 1e3);
        self.define("megavolt", Voltage, 1e6);

        // current, base ampere
        self.define("amp", Current, 1.0);
        self.define("milliamp", Current, 1e-3);

        // frequency, base hertz; rpm counts revolutions per minute
        self.define("hertz", Frequency, 1.0);
        self.define("kilohertz", Frequency, 1e3);
        self.define("rpm", Frequency, 1.0 / 60.0);

        // resistance, base ohm
        self.define("ohm", Resistance, 1.0);
        self.define("kiloohm", Resistance, 1e3);

        // mass, base kilogram
        self.define("kilogram", Mass, 1.0);
        self.define("pound", Mass, 0.453_592_37);
        self.define("ton", Mass, 907.184_74);

        // mass flow, base kilogram/second
        self.define("kilogram/hour", MassFlow, 1.0 / 3_600.0);
        self.define("pound/hour", MassFlow, 0.453_592_37 / 3_600.0);

        // volume, base cubic meter
        self.define("meter**3", Volume, 1.0);
        self.define("liter", Volume, 1e-3);
        self.define("gallon", Volume, 3.785_411_784e-3);
        self.define("foot**3", Volume, 0.028_316_846_592);

        // volume flow, base cubic meter/second
        self.define("foot**3/second", VolumeFlow, 0.028_316_846_592);
        self.define("foot**3/minute", VolumeFlow, 0.028_316_846_592 / 60.0);
        self.define("foot**3/hour", VolumeFlow, 0.028_316_846_592 / 3_600.0);
        self.define("meter**3/hour", VolumeFlow, 1.0 / 3_600.0);
        self.define("gallon/minute", VolumeFlow, 3.785_411_784e-3 / 60.0);
        self.define("gallon/hour", VolumeFlow, 3.785_411_784e-3 / 3_600.0);
        self.define("megagallon/day", VolumeFlow, 3_785.411_784 / 86_400.0);
        self.define("liter/second", VolumeFlow, 1e-3);
        self.define("liter/minute", VolumeFlow, 1e-3 / 60.0);
        self.define("liter/hour", VolumeFlow, 1e-3 / 3_600.0);

        // velocity, base meter/second
        self.define("mph", Velocity, 0.447_04);
        self.define("kph", Velocity, 1_000.0 / 3_600.0);

        // temperature, base kelvin (affine)
        self.define_affine("kelvin", Temperature, 1.0, 0.0);
        self.define_affine("degC", Temperature, 1.0, 273.15);
        self.define_affine("degF", Temperature, 5.0 / 9.0, 255.372_222_222_222_24);

        // phase / rotation, base degree
        self.define("degree", Angle, 1.0);
        self.define("revolution", Angle, 360.0);

        // irradiance, base watt/square meter
        self.define("watt/meter**2", Irradiance, 1.0);

        // time, base second
        self.define("day", Time, 86_400.0);
        self.define("hour", Time, 3_600.0);
        self.define("minute", Time, 60.0);
        self.define("second", Time, 1.0);
        self.define("millisecond", Time, 1e-3);

        // pressure, base pascal
        self.define("pascal", Pressure, 1.0);
        self.define("kilopascal", Pressure, 1e3);
        self.define("inHg", Pressure, 3_386.389);
        self.define("cmHg", Pressure, 1_333.224);
        self.define("mmHg", Pressure, 133.322_4);

        // event counts and ratios, no physical dimension
        self.define(DIMENSIONLESS, Dimensionless, 1.0);
        self.define("cycles", Dimensionless, 1.0);
    }

    /// Vendor unit labels as reported on Obvius payload points.
    ///
    /// An empty target means the label is deliberately dimensionless
    /// (percentages, power factors, bare counts).
    #[rustfmt::skip]
    fn register_vendor_labels(&mut self) {
        let labels: &[(&'static str, &'static str)] = &[
            // energy
            ("kWh", "kilowatthour"),
            ("Wh", "watthour"),
            ("MWh", "megawatthour"),
            ("VAh", "volt_ampere*hour"),
            ("kVAh", "kilovolt_ampere*hour"),
            ("MVAh", "megavolt_ampere*hour"),
            ("VARh", "volt_ampere*hour"),
            ("kVARh", "kilovolt_ampere*hour"),
            ("MVARh", "megavolt_ampere*hour"),
            ("Btu", "btu"),
            ("kBtu", "kilobtu"),
            ("MBtu", "megabtu"),
            ("MMBtu", "megabtu"),
            ("BtuE6", "megabtu"),
            ("Ton-Hrs", "ton*hour"),
            ("therms", "thm"),
            // power
            ("W", "watt"),
            ("mW", "milliwatt"),
            ("kW", "kilowatt"),
            ("MW", "megawatt"),
            ("VA", "volt_ampere"),
            ("kVA", "kilovolt_ampere"),
            ("MVA", "megavolt_ampere"),
            ("VAR", "volt_ampere"),
            ("kVAR", "kilovolt_ampere"),
            ("MVAR", "megavolt_ampere"),
            ("Btu/hr", "btu/hour"),
            // voltage
            ("Volts", "volt"),
            ("mV", "millivolt"),
            ("kV", "kilovolt"),
            ("MV", "megavolt"),
            // current
            ("Amps", "amp"),
            ("mA", "milliamp"),
            // event counting
            ("cycles", "cycles"),
            ("pulses", ""),
            ("revolutions", "revolution"),
            ("starts", ""),
            // frequency
            ("Hz", "hertz"),
            ("kHz", "kilohertz"),
            ("RPM", "rpm"),
            // resistance
            ("Ohms", "ohm"),
            ("kohms", "kiloohm"),
            // mass
            ("kgs", "kilogram"),
            ("Lbs", "pound"),
            ("Tons", "ton"),
            // mass flow
            ("kg/hr", "kilogram/hour"),
            ("Lb/hr", "pound/hour"),
            // volume
            ("Gallons", "gallon"),
            ("Cubic Feet", "foot**3"),
            ("Cubic Meters", "meter**3"),
            ("Liters", "liter"),
            // volume flow
            ("Cubic Feet/sec", "foot**3/second"),
            ("Cubic Feet/min", "foot**3/minute"),
            ("CFm", "foot**3/minute"),
            ("CFM", "foot**3/minute"),
            ("Cubic Feet/hr", "foot**3/hour"),
            ("CFH", "foot**3/hour"),
            ("Cubic Meters/hr", "meter**3/hour"),
            ("Gpm", "gallon/minute"),
            ("Gph", "gallon/hour"),
            ("MGD", "megagallon/day"),
            ("Liters/sec", "liter/second"),
            ("Liters/min", "liter/minute"),
            ("Liters/hr", "liter/hour"),
            // velocity
            ("MPH", "mph"),
            ("KPH", "kph"),
            // temperature
            ("Degrees C", "degC"),
            ("Degrees F", "degF"),
            ("C", "degC"),
            ("F", "degF"),
            // humidity
            ("%RH", ""),
            // phase
            ("Degrees", "degree"),
            // electrical
            ("PF", ""),
            ("aPF", ""),
            ("dPF", ""),
            // intensity
            ("W/m^2", "watt/meter**2"),
            // dimensionless
            ("%", ""),
            ("PPM", ""),
            ("", ""),
            // time
            ("days", "day"),
            ("hours", "hour"),
            ("minutes", "minute"),
            ("seconds", "second"),
            ("ms", "millisecond"),
            // pressure
            ("Pa", "pascal"),
            ("kPa", "kilopascal"),
            ("inWC", ""),
            ("inAq", ""),
            ("inHg", "inHg"),
            ("cmHg", "cmHg"),
            ("mmHg", "mmHg"),
        ];

        for (label, canonical) in labels {
            self.vendor.insert(label, canonical);
        }
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}
