// Model of the data read in this app

/// One full sample of the INA219 measurement registers.
pub struct PowerReading {
    pub shunt_mv: f32,
    pub bus_v: f32,
    pub current_ma: f32,
    pub power_mw: f32,
}

impl PowerReading {
    /// Estimated supply-side voltage: bus voltage plus the drop across the shunt.
    pub fn load_voltage_v(&self) -> f32 {
        self.bus_v + self.shunt_mv / 1000.0
    }
}
