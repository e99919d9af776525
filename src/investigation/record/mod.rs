//! The two append-only text logs of a LogMFD run.
//!
//! * the run log (`logmfd.out`), written by replica 0 only: free energy,
//!   temperature, bath variables and every (X, V, mean force) triplet;
//! * the replica log (`replica.out`, `replica.out.<rank>` with several
//!   replicas): work, weight and the mean CV values of that replica.
//!
//! Each gets a header once and one fixed-width record per MFD step. The
//! column layout is a compatibility contract with existing analysis scripts.

use std::fmt;
use std::io;

mod file;
mod memory;

pub use file::{replica_path, FileSink, REPLICA_LOG, RUN_LOG};
pub use memory::MemorySink;

/// Which of the two logs a block of text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Run,
    Replica,
}

/// Destination of the formatted logs.
///
/// The dynamics never touch files directly; whoever builds the run decides
/// where the text goes.
pub trait LogSink: Send {
    /// Appends `text` to `stream`.
    fn append(&mut self, stream: Stream, text: &str) -> io::Result<()>;
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn append(&mut self, stream: Stream, text: &str) -> io::Result<()> {
        (**self).append(stream, text)
    }
}

pub struct RunHeader<'a> {
    pub replicas: usize,
    pub names: &'a [String],
    pub masses: &'a [f64],
    pub bath_mass: f64,
}

impl fmt::Display for RunHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.replicas > 1 {
            writeln!(f, "# LogPD, replica parallel of LogMFD")?;
            writeln!(f, "# number of replica : {}", self.replicas)?;
        } else {
            writeln!(f, "# LogMFD")?;
        }

        write!(f, "# CVs :")?;
        for name in self.names {
            write!(f, " {name}")?;
        }
        writeln!(f)?;

        write!(f, "# Mass for CV particles :")?;
        for m in self.masses {
            write!(f, "{m:18.9}")?;
        }
        writeln!(f)?;

        writeln!(f, "# Mass for thermostat   :{:18.9}", self.bath_mass)?;
        writeln!(f, "# 1:iter_md, 2:Flog, 3:2*Ekin/gkb[K], 4:eta, 5:Veta,")?;
        for (i, name) in self.names.iter().enumerate() {
            writeln!(
                f,
                "# {}:{name}_fict(t), {}:{name}_vfict(t), {}:{name}_force(t),",
                6 + i * 3,
                7 + i * 3,
                8 + i * 3
            )?;
        }
        Ok(())
    }
}

pub struct RunRecord<'a> {
    pub iteration: u64,
    pub flog: f64,
    pub temperature: f64,
    pub eta: f64,
    pub veta: f64,
    pub value: &'a [f64],
    pub velocity: &'a [f64],
    pub force: &'a [f64],
}

impl fmt::Display for RunRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", self.iteration)?;
        write!(f, "{:18.9}", self.flog)?;
        write!(f, "{:18.9}", self.temperature)?;
        write!(f, "{:18.9}", self.eta)?;
        write!(f, "{:18.9}", self.veta)?;
        for i in 0..self.value.len() {
            write!(f, "{:18.9}", self.value[i])?;
            write!(f, "{:18.9}", self.velocity[i])?;
            write!(f, "{:18.9}", self.force[i])?;
        }
        writeln!(f, " ")
    }
}

pub struct ReplicaHeader<'a> {
    pub rank: usize,
    pub size: usize,
    pub names: &'a [String],
}

impl fmt::Display for ReplicaHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Replica No. {} of {}.", self.rank, self.size)?;
        writeln!(f, "# 1:iter_md, 2:work, 3:weight,")?;
        for (i, name) in self.names.iter().enumerate() {
            writeln!(f, "# {}:{name}(q)", 4 + i)?;
        }
        Ok(())
    }
}

pub struct ReplicaRecord<'a> {
    pub iteration: u64,
    pub work: f64,
    pub weight: f64,
    pub average: &'a [f64],
}

impl fmt::Display for ReplicaRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", self.iteration)?;
        write!(f, "{:>16} ", scientific(self.work, 6))?;
        write!(f, "{:>16} ", scientific(self.weight, 6))?;
        for a in self.average {
            write!(f, "{a:18.9}")?;
        }
        writeln!(f, " ")
    }
}

/// printf-style `%.{precision}e`: signed, at least two exponent digits.
fn scientific(x: f64, precision: usize) -> String {
    let s = format!("{:.*e}", precision, x);
    match s.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.abs())
            }
            Err(_) => s,
        },
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scientific_matches_printf() {
        assert_eq!(scientific(0.0, 6), "0.000000e+00");
        assert_eq!(scientific(1.0, 6), "1.000000e+00");
        assert_eq!(scientific(0.5, 6), "5.000000e-01");
        assert_eq!(scientific(-4.049512e-6, 6), "-4.049512e-06");
        assert_eq!(scientific(1.5e123, 2), "1.50e+123");
    }

    #[test]
    fn replica_record_columns() {
        let record = ReplicaRecord {
            iteration: 2,
            work: 0.0,
            weight: 0.5,
            average: &[-2.856237851],
        };
        assert_eq!(
            record.to_string(),
            "       2    0.000000e+00     5.000000e-01       -2.856237851 \n"
        );
    }
}
