//! Classical bit registers written by measurements and read by classically
//! controlled operations.
//!
//! A register is an ordered list of `(bit_id, value)` pairs. Bits can be
//! addressed either by position or by ID through a [`BitSelector`]. Registers
//! live in a [`Registry`], which keeps them in creation order.

use std::{ fmt, ops::Index };
use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;
use crate::error::{ CliffordError, SimResult };

/// Addresses a single bit of a [`ClassicalRegister`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitSelector {
    /// Position of the bit in the register.
    Order(usize),
    /// ID of the bit.
    Id(String),
}

impl BitSelector {
    /// Build a selector from a pair of optional arguments, exactly one of
    /// which must be given.
    pub fn from_options(bit_order: Option<usize>, bit_id: Option<String>)
        -> SimResult<Self>
    {
        match (bit_order, bit_id) {
            (Some(k), None) => Ok(Self::Order(k)),
            (None, Some(id)) => Ok(Self::Id(id)),
            _ => Err(CliffordError::InvalidValue(
                "Exactly one of bit_order and bit_id must be specified.".into()
            )),
        }
    }
}

impl From<usize> for BitSelector {
    fn from(k: usize) -> Self { Self::Order(k) }
}

impl From<&str> for BitSelector {
    fn from(id: &str) -> Self { Self::Id(id.into()) }
}

impl fmt::Display for BitSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order(k) => write!(f, "bit_order={}", k),
            Self::Id(id) => write!(f, "bit_id={}", id),
        }
    }
}

fn generate_bit_id() -> String { Uuid::new_v4().to_string() }

fn check_reg(reg: &[(String, u8)]) -> SimResult<()> {
    if reg.iter().any(|(_, b)| *b > 1) {
        return Err(CliffordError::InvalidValue(
            "The register should only contain binary values.".into()
        ));
    }
    if !reg.iter().map(|(id, _)| id).all_unique() {
        return Err(CliffordError::InvalidValue(
            "The bit IDs of the register should be unique.".into()
        ));
    }
    Ok(())
}

/// A named, ordered register of classical bits with stable per-bit IDs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalRegister {
    name: String,
    reg: Vec<(String, u8)>,
}

impl ClassicalRegister {
    /// Create a new register with all bits set to 0.
    ///
    /// Bit IDs are random UUIDv4 strings unless given. Fails if the number of
    /// IDs given differs from `no_of_bits` or if the IDs are not unique.
    pub fn new(name: &str, no_of_bits: usize, bit_ids: Option<Vec<String>>)
        -> SimResult<Self>
    {
        let ids: Vec<String>
            = match bit_ids {
                Some(ids) if ids.len() != no_of_bits => {
                    return Err(CliffordError::InvalidValue(format!(
                        "The number of bit IDs ({}) must be equal to the number \
                        of bits in the register ({}).",
                        ids.len(), no_of_bits,
                    )));
                },
                Some(ids) => ids,
                None => (0..no_of_bits).map(|_| generate_bit_id()).collect(),
            };
        let reg: Vec<(String, u8)> = ids.into_iter().map(|id| (id, 0)).collect();
        check_reg(&reg)?;
        Ok(Self { name: name.into(), reg })
    }

    /// Name of the register.
    pub fn name(&self) -> &str { &self.name }

    /// Number of bits.
    pub fn no_of_bits(&self) -> usize { self.reg.len() }

    /// Bit IDs, in order.
    pub fn bit_ids(&self) -> Vec<&str> {
        self.reg.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Bit values, in order.
    pub fn bit_reg(&self) -> Vec<u8> {
        self.reg.iter().map(|(_, b)| *b).collect()
    }

    /// Bit values keyed by ID.
    pub fn id_bit_reg(&self) -> FxHashMap<String, u8> {
        self.reg.iter().cloned().collect()
    }

    /// The `(bit_id, value)` pairs, in order.
    pub fn reg(&self) -> &[(String, u8)] { &self.reg }

    /// Replace the contents of the register.
    ///
    /// Fails if any value is not 0 or 1 or if the IDs are not unique.
    pub fn set_reg(&mut self, reg: Vec<(String, u8)>) -> SimResult<()> {
        check_reg(&reg)?;
        self.reg = reg;
        Ok(())
    }

    /// Resolve a selector to a bit position.
    ///
    /// Fails with [`CliffordError::ClassicalOperation`] naming the valid
    /// choices if the selector does not exist in this register.
    pub fn bit_index(&self, sel: &BitSelector) -> SimResult<usize> {
        match sel {
            BitSelector::Order(k) if *k < self.reg.len() => Ok(*k),
            BitSelector::Order(k) => Err(CliffordError::ClassicalOperation(format!(
                "The selected bit_order, {}, does not exist or is not valid in {}. \
                There are only {} bits in the register.",
                k, self.name, self.reg.len(),
            ))),
            BitSelector::Id(id) => {
                self.reg.iter().position(|(bit_id, _)| bit_id == id)
                    .ok_or_else(|| CliffordError::ClassicalOperation(format!(
                        "The selected bit_id, {}, does not exist or is not valid \
                        in {}. The only available bit IDs in this register are: \
                        [{}]",
                        id,
                        self.name,
                        self.reg.iter().map(|(bit_id, _)| format!("'{}'", bit_id))
                            .join(", "),
                    )))
            },
        }
    }

    /// Read a bit.
    pub fn get(&self, sel: &BitSelector) -> SimResult<u8> {
        self.bit_index(sel).map(|k| self.reg[k].1)
    }

    /// Write a bit.
    pub fn set(&mut self, sel: &BitSelector, value: bool) -> SimResult<()> {
        let k = self.bit_index(sel)?;
        self.reg[k].1 = u8::from(value);
        Ok(())
    }

    /// Take an immutable copy of the register, tagged with a time step.
    pub fn snapshot(&self, time_step: usize) -> ClassicalRegisterSnapshot {
        ClassicalRegisterSnapshot {
            name: self.name.clone(),
            time_step,
            reg: self.reg.clone(),
        }
    }

    /// Rebuild the register a snapshot was taken of.
    pub fn restore(snapshot: &ClassicalRegisterSnapshot) -> Self {
        Self { name: snapshot.name.clone(), reg: snapshot.reg.clone() }
    }
}

/// An immutable copy of a [`ClassicalRegister`] taken at a time step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalRegisterSnapshot {
    pub name: String,
    pub time_step: usize,
    pub reg: Vec<(String, u8)>,
}

fn missing_register(name: &str) -> CliffordError {
    CliffordError::ClassicalRegister(format!(
        "An error has occured when trying to select the register, {}.", name
    ))
}

/// The bank of classical registers owned by an engine, in creation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registry {
    regs: Vec<ClassicalRegister>,
    index: FxHashMap<String, usize>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self { Self::default() }

    /// Number of registers.
    pub fn len(&self) -> usize { self.regs.len() }

    /// `true` if there are no registers.
    pub fn is_empty(&self) -> bool { self.regs.is_empty() }

    /// `true` if a register named `name` exists.
    pub fn contains(&self, name: &str) -> bool { self.index.contains_key(name) }

    /// Look up a register by name.
    pub fn get(&self, name: &str) -> Option<&ClassicalRegister> {
        self.index.get(name).map(|k| &self.regs[*k])
    }

    /// Look up a register by name, failing with
    /// [`CliffordError::ClassicalRegister`] if it does not exist.
    pub fn select(&self, name: &str) -> SimResult<&ClassicalRegister> {
        self.get(name).ok_or_else(|| missing_register(name))
    }

    /// Like [`Self::select`], but mutable.
    pub fn select_mut(&mut self, name: &str) -> SimResult<&mut ClassicalRegister> {
        match self.index.get(name) {
            Some(k) => Ok(&mut self.regs[*k]),
            None => Err(missing_register(name)),
        }
    }

    /// Add a register, failing if one of the same name exists.
    pub fn insert(&mut self, reg: ClassicalRegister) -> SimResult<()> {
        if self.contains(reg.name()) {
            return Err(CliffordError::ClassicalRegister(format!(
                "A classical register named {} already exists.", reg.name()
            )));
        }
        self.index.insert(reg.name().to_string(), self.regs.len());
        self.regs.push(reg);
        Ok(())
    }

    /// Register names, in creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.regs.iter().map(|reg| reg.name())
    }

    /// Registers, in creation order.
    pub fn iter(&self) -> std::slice::Iter<'_, ClassicalRegister> {
        self.regs.iter()
    }
}

impl Index<&str> for Registry {
    type Output = ClassicalRegister;

    /// *Panics if no register named `name` exists.*
    fn index(&self, name: &str) -> &ClassicalRegister {
        self.get(name)
            .unwrap_or_else(|| panic!("no classical register named {}", name))
    }
}
