// tm-core/src/units.rs

use uom::si::f64::{
    AngularVelocity as UomAngularVelocity, MassRate as UomMassRate, Power as UomPower,
    Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature, Torque as UomTorque,
};

// Public canonical unit types (SI, f64)
pub type AngularVelocity = UomAngularVelocity;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;
pub type Torque = UomTorque;

/// Specific enthalpy [J/kg].
///
/// Not part of uom's standard set, so we use f64 with clear documentation.
pub type SpecEnthalpy = f64;

/// Specific entropy [J/(kg·K)].
pub type SpecEntropy = f64;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn rad_per_s(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::radian_per_second;
    AngularVelocity::new::<radian_per_second>(v)
}

#[inline]
pub fn nm(v: f64) -> Torque {
    use uom::si::torque::newton_meter;
    Torque::new::<newton_meter>(v)
}

#[inline]
pub fn watts(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}
