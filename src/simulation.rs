use crate::config::{LogMfdConfig, Parameters, Units};
use crate::core::geometry::CvDomain;
use crate::core::solve::constraints::{Constraint, MirrorBoundary};
use crate::core::solve::{NoseHoover, Thermostat, ThermostatKind, VelocityScaling};
use crate::core::state::FictitiousState;
use crate::error::{LogMfdError, Result};
use crate::investigation::record::{LogSink, ReplicaHeader, ReplicaRecord, RunHeader, RunRecord, Stream};
use crate::laws::{FreeEnergy, HarmonicRestraint, ReplicaWeighting, RestraintOutput};
use crate::platform::comm::Communicator;

/// The LOGMFD biasing action of one replica.
///
/// The host drives it with two calls per MD step:
///
/// 1. [`LogMfd::calculate`] with the current CV values. Returns the restraint
///    forces to apply to the CVs and the bias energy.
/// 2. [`LogMfd::update`] with the step number. Every `interval` steps this
///    advances the fictitious variables by one MFD step and appends to the logs.
pub struct LogMfd {
    params: Parameters,
    state: FictitiousState,
    domains: Vec<Box<dyn CvDomain>>,
    restraint: HarmonicRestraint,
    thermostat: Thermostat,
    replica: ReplicaWeighting,
    comm: Box<dyn Communicator>,
    sink: Box<dyn LogSink>,
    /// Set by the first `calculate`, when the initial CV values are known.
    free_energy: Option<FreeEnergy>,
    flog: f64,
    bias: f64,
}

impl LogMfd {
    /// Sets up a run. `domains` holds one entry per CV, in the order of `params.names`.
    ///
    /// `params` is checked again here, so hand-built parameters with
    /// mismatched lengths or a zero interval are rejected instead of panicking.
    pub fn new(
        params: Parameters,
        domains: Vec<Box<dyn CvDomain>>,
        comm: Box<dyn Communicator>,
        sink: Box<dyn LogSink>,
    ) -> Result<Self> {
        params.check()?;
        let n = params.names.len();
        if domains.len() != n {
            return Err(LogMfdError::CvCountMismatch {
                expected: n,
                found: domains.len(),
            });
        }

        let mut state = FictitiousState::new(params.names.clone());
        state.velocity.copy_from_slice(&params.vfict);
        state.mass.copy_from_slice(&params.mfict);
        state.min.copy_from_slice(&params.fict_min);
        state.max.copy_from_slice(&params.fict_max);
        if let Some(fict) = &params.fict {
            state.value.copy_from_slice(fict);
        }

        let thermostat = match params.thermostat {
            ThermostatKind::Nve => Thermostat::Nve,
            ThermostatKind::Nvt => NoseHoover::new(params.xeta, params.veta, params.meta, params.nkt()).into(),
            ThermostatKind::Vs => VelocityScaling::new(0.0, params.nkt()).into(),
        };

        let restraint = HarmonicRestraint::new(params.kappa.clone());
        let replica = ReplicaWeighting::new(params.work, params.kbt);

        let run = Self {
            flog: params.flog,
            params,
            state,
            domains,
            restraint,
            thermostat,
            replica,
            comm,
            sink,
            free_energy: None,
            bias: 0.0,
        };
        run.log_banner();
        Ok(run)
    }

    /// Validates `config` against the given CVs and sets up the run.
    pub fn from_config(
        config: &LogMfdConfig,
        cvs: Vec<(String, Box<dyn CvDomain>)>,
        units: &Units,
        comm: Box<dyn Communicator>,
        sink: Box<dyn LogSink>,
    ) -> Result<Self> {
        let (names, domains): (Vec<String>, Vec<Box<dyn CvDomain>>) = cvs.into_iter().unzip();
        let params = config.validate(&names, units, comm.rank(), comm.size())?;
        Self::new(params, domains, comm, sink)
    }

    fn mode(&self) -> &'static str {
        match (self.comm.size() > 1, self.params.flattening.is_tamd()) {
            (true, true) => "TAMD-PD, replica parallel of TAMD, no logarithmic flattening",
            (true, false) => "LogPD, replica parallel of LogMFD",
            (false, true) => "TAMD, no logarithmic flattening",
            (false, false) => "LogMFD, logarithmic flattening",
        }
    }

    fn log_banner(&self) {
        let p = &self.params;
        tracing::info!(
            target: "logmfd",
            mode = self.mode(),
            replicas = self.comm.size(),
            rank = self.comm.rank(),
            "LOGMFD action set up"
        );
        tracing::info!(
            target: "logmfd",
            kappa = ?p.kappa,
            interval = p.interval,
            delta_t = p.delta_t,
            alpha = p.flattening.alpha(),
            gamma = p.flattening.gamma(),
            thermostat = %p.thermostat,
            flog = p.flog,
            kbt = p.kbt,
            "parameters"
        );
        tracing::info!(
            target: "logmfd",
            mass = ?p.mfict,
            fict = ?p.fict,
            vfict = ?p.vfict,
            fict_max = ?p.fict_max,
            fict_min = ?p.fict_min,
            "fictitious variables"
        );
    }

    /// Evaluates the restraint for the CV values of the current MD step.
    ///
    /// The first call also fixes the initial state: X from the CVs if FICT was
    /// not given, H_log, and the log headers.
    pub fn calculate(&mut self, cvs: &[f64]) -> Result<RestraintOutput> {
        if cvs.len() != self.state.len() {
            return Err(LogMfdError::CvCountMismatch {
                expected: self.state.len(),
                found: cvs.len(),
            });
        }
        if self.free_energy.is_none() {
            self.start(cvs)?;
        }

        let output = self.restraint.accumulate(&mut self.state, cvs, &self.domains);
        self.bias = output.energy;

        for (x, domain) in self.state.value.iter_mut().zip(&self.domains) {
            *x = domain.bring_back(*x);
        }

        tracing::trace!(bias = output.energy, "restraint evaluated");
        Ok(output)
    }

    fn start(&mut self, cvs: &[f64]) -> Result<()> {
        if self.params.fict.is_none() {
            let replicas = self.comm.size() as f64;
            for i in 0..self.state.len() {
                let mut x = cvs[i];
                if self.comm.size() > 1 {
                    x = self.comm.sum(x)? / replicas;
                }
                self.state.value[i] = x;
            }
        }

        self.state.reset_accumulators();

        let flattening = self.params.flattening;
        if let Thermostat::VelocityScaling(vs) = &mut self.thermostat {
            vs.initialize_velocities(&mut self.state);
            vs.potential = flattening.flatten(self.params.flog);
        }

        let free_energy = FreeEnergy::new(flattening, &self.thermostat, &self.state, self.params.flog);
        self.free_energy = Some(free_energy);
        self.flog = self.params.flog;
        self.replica.weight = 1.0;

        tracing::debug!(hlog = free_energy.hlog(), initial = ?self.state.value, "initial state fixed");

        if self.comm.rank() == 0 {
            let header = RunHeader {
                replicas: self.comm.size(),
                names: &self.state.names,
                masses: &self.state.mass,
                bath_mass: self.params.meta,
            };
            self.sink.append(Stream::Run, &header.to_string())?;
        }
        let header = ReplicaHeader {
            rank: self.comm.rank(),
            size: self.comm.size(),
            names: &self.state.names,
        };
        self.sink.append(Stream::Replica, &header.to_string())?;
        Ok(())
    }

    /// Runs one MFD step if `step` is a multiple of the interval.
    /// Returns whether it did.
    pub fn update(&mut self, step: u64) -> Result<bool> {
        if step % self.params.interval != 0 {
            return Ok(false);
        }
        let free_energy = self.free_energy.ok_or(LogMfdError::NotStarted)?;
        let iteration = step / self.params.interval;
        let dt = self.params.delta_t;

        HarmonicRestraint::average_over_interval(&mut self.state, &self.domains, self.params.interval);
        self.replica.mean_force(&mut self.state, self.comm.as_ref(), dt)?;

        self.thermostat.step(&mut self.state, &free_energy, dt)?;
        MirrorBoundary.project(&mut self.state);

        self.flog = free_energy.reconstruct(&self.thermostat, &self.state);
        if !self.flog.is_finite() {
            tracing::error!(iteration, flog = self.flog, "free energy diverged");
            return Err(LogMfdError::NonFinite {
                quantity: "free energy",
                iteration,
            });
        }

        self.record(iteration)?;

        tracing::debug!(
            iteration,
            flog = self.flog,
            work = self.replica.work,
            weight = self.replica.weight,
            "MFD step"
        );

        self.state.reset_accumulators();
        Ok(true)
    }

    fn record(&mut self, iteration: u64) -> Result<()> {
        if self.comm.rank() == 0 {
            // without a bath the columns echo XETA and VETA
            let (eta, veta) = match &self.thermostat {
                Thermostat::NoseHoover(bath) => (bath.eta, bath.veta),
                _ => (self.params.xeta, self.params.veta),
            };
            let record = RunRecord {
                iteration,
                flog: self.flog,
                temperature: self.state.temperature(self.params.kboltzmann),
                eta,
                veta,
                value: &self.state.value,
                velocity: &self.state.velocity,
                force: &self.state.force,
            };
            self.sink.append(Stream::Run, &record.to_string())?;
        }
        let record = ReplicaRecord {
            iteration,
            work: self.replica.work,
            weight: self.replica.weight,
            average: &self.state.average,
        };
        self.sink.append(Stream::Replica, &record.to_string())?;
        Ok(())
    }

    /// Looks up an output component, `<cv>_fict` or `<cv>_vfict`.
    pub fn component(&self, name: &str) -> Result<f64> {
        for (i, cv) in self.state.names.iter().enumerate() {
            if let Some(suffix) = name.strip_prefix(cv.as_str()) {
                match suffix {
                    "_fict" => return Ok(self.state.value[i]),
                    "_vfict" => return Ok(self.state.velocity[i]),
                    _ => {}
                }
            }
        }
        Err(LogMfdError::UnknownComponent(name.to_string()))
    }

    /// All output components with their current values.
    pub fn components(&self) -> Vec<(String, f64)> {
        let mut out = Vec::with_capacity(2 * self.state.len());
        for (i, cv) in self.state.names.iter().enumerate() {
            out.push((format!("{cv}_fict"), self.state.value[i]));
            out.push((format!("{cv}_vfict"), self.state.velocity[i]));
        }
        out
    }

    pub fn fict(&self, i: usize) -> f64 {
        self.state.value[i]
    }

    pub fn vfict(&self, i: usize) -> f64 {
        self.state.velocity[i]
    }

    /// Current free energy estimate F(X(t)).
    pub fn flog(&self) -> f64 {
        self.flog
    }

    /// H_log, once the run has started.
    pub fn hlog(&self) -> Option<f64> {
        self.free_energy.map(|f| f.hlog())
    }

    /// Restraint energy of the last `calculate`.
    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn state(&self) -> &FictitiousState {
        &self.state
    }

    pub fn thermostat(&self) -> &Thermostat {
        &self.thermostat
    }

    pub fn replica(&self) -> &ReplicaWeighting {
        &self.replica
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn rank(&self) -> usize {
        self.comm.rank()
    }
}
