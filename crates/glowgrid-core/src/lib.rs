//! Core simulation engine shared across the GlowGrid workspace.
//!
//! A GlowGrid world is a toroidal grid of cells, each running a small
//! evolvable program that drives two LEDs and a speaker, senses visitor
//! activity, spends an energy budget, and probabilistically overwrites a
//! neighbor with a mutated copy of its own genome.

use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng, rngs::SmallRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Number of display variables encoded in the tail of every genome.
pub const NUM_VARS: usize = 10;
/// Number of sensor channels wired into each cell.
pub const NUM_SENSORS: usize = 4;

/// Display-state value meaning "off" for the LED/speaker state slots.
pub const VAR_OFF: u8 = 0;
/// Display-state value meaning "on" for the LED/speaker state slots.
pub const VAR_ON: u8 = 1;

/// Slot layout of the genome variable region and of every display frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(usize)]
pub enum DisplaySlot {
    Led0Hue = 0,
    Led0Sat,
    Led0Bright,
    Led0State,
    Led1Hue,
    Led1Sat,
    Led1Bright,
    Led1State,
    SpeakerIndex,
    SpeakerState,
}

impl DisplaySlot {
    /// Position of this slot inside a frame or genome variable region.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One of the two LEDs on a cell's face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedId {
    Led0,
    Led1,
}

impl LedId {
    const fn slots(self) -> [DisplaySlot; 4] {
        match self {
            Self::Led0 => [
                DisplaySlot::Led0Hue,
                DisplaySlot::Led0Sat,
                DisplaySlot::Led0Bright,
                DisplaySlot::Led0State,
            ],
            Self::Led1 => [
                DisplaySlot::Led1Hue,
                DisplaySlot::Led1Sat,
                DisplaySlot::Led1Bright,
                DisplaySlot::Led1State,
            ],
        }
    }

    const fn state_slot(self) -> DisplaySlot {
        match self {
            Self::Led0 => DisplaySlot::Led0State,
            Self::Led1 => DisplaySlot::Led1State,
        }
    }
}

/// Sensor channels a cell can detect activity on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum SensorKind {
    Touch = 0,
    Motion,
    Sound,
    Co2,
}

impl SensorKind {
    /// All sensor channels in countdown-array order.
    pub const ALL: [Self; NUM_SENSORS] = [Self::Touch, Self::Motion, Self::Sound, Self::Co2];

    /// Position of this sensor in the per-cell countdown array.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Detection window for sensor queries: this exact tick, or within the
/// configured long-term duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    Short,
    Long,
}

/// A hue/saturation/brightness triple on the configured variable scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsbColor {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

/// Fixed-width display state: both LED colors and states, speaker index and
/// state. `Copy` by design so every read hands out a value snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFrame(pub [u8; NUM_VARS]);

impl DisplayFrame {
    /// Read one slot.
    #[must_use]
    pub const fn get(&self, slot: DisplaySlot) -> u8 {
        self.0[slot.index()]
    }

    /// Write one slot.
    pub const fn set(&mut self, slot: DisplaySlot, value: u8) {
        self.0[slot.index()] = value;
    }

    /// Whether the given LED is switched on.
    #[must_use]
    pub fn led_on(&self, led: LedId) -> bool {
        self.get(led.state_slot()) == VAR_ON
    }

    /// Whether the speaker is switched on.
    #[must_use]
    pub fn speaker_on(&self) -> bool {
        self.get(DisplaySlot::SpeakerState) == VAR_ON
    }

    /// Currently displayed HSB color of the given LED.
    #[must_use]
    pub fn led_color(&self, led: LedId) -> HsbColor {
        let [hue, sat, bright, _state] = led.slots();
        HsbColor {
            hue: f32::from(self.get(hue)),
            saturation: f32::from(self.get(sat)),
            brightness: f32::from(self.get(bright)),
        }
    }
}

/// Closed instruction set executed by the cell VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0,
    Led0On,
    Led0Off,
    Led0Toggle,
    Led1On,
    Led1Off,
    Led1Toggle,
    SpeakerOn,
    SpeakerOff,
    BufferSetData,
    BufferGetData,
    MessageSend,
    MessageRetrieve,
    IfMotion,
    IfNMotion,
    IfSound,
    IfNSound,
    IfTouch,
    IfNTouch,
    IfCo2,
    IfNCo2,
    IfLoEnergy,
    IfHiEnergy,
    Label,
    Jump,
    Reproduce,
}

impl Opcode {
    /// Every opcode, indexed by its genome encoding.
    pub const ALL: [Self; 26] = [
        Self::Nop,
        Self::Led0On,
        Self::Led0Off,
        Self::Led0Toggle,
        Self::Led1On,
        Self::Led1Off,
        Self::Led1Toggle,
        Self::SpeakerOn,
        Self::SpeakerOff,
        Self::BufferSetData,
        Self::BufferGetData,
        Self::MessageSend,
        Self::MessageRetrieve,
        Self::IfMotion,
        Self::IfNMotion,
        Self::IfSound,
        Self::IfNSound,
        Self::IfTouch,
        Self::IfNTouch,
        Self::IfCo2,
        Self::IfNCo2,
        Self::IfLoEnergy,
        Self::IfHiEnergy,
        Self::Label,
        Self::Jump,
        Self::Reproduce,
    ];

    /// Decode a genome slot. Encodings are kept in range by construction;
    /// the modulo keeps a corrupted slot from ever reading out of range.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        Self::ALL[code as usize % Self::ALL.len()]
    }

    #[must_use]
    const fn code(self) -> u8 {
        self as u8
    }

    /// Assembly-style name used in genome listings.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Led0On => "LED0_ON",
            Self::Led0Off => "LED0_OFF",
            Self::Led0Toggle => "LED0_TOGGLE",
            Self::Led1On => "LED1_ON",
            Self::Led1Off => "LED1_OFF",
            Self::Led1Toggle => "LED1_TOGGLE",
            Self::SpeakerOn => "SPEAKER_ON",
            Self::SpeakerOff => "SPEAKER_OFF",
            Self::BufferSetData => "BUFFER_SET_DATA",
            Self::BufferGetData => "BUFFER_GET_DATA",
            Self::MessageSend => "MESSAGE_SEND",
            Self::MessageRetrieve => "MESSAGE_RETRIEVE",
            Self::IfMotion => "IF_MOTION",
            Self::IfNMotion => "IF_N_MOTION",
            Self::IfSound => "IF_SOUND",
            Self::IfNSound => "IF_N_SOUND",
            Self::IfTouch => "IF_TOUCH",
            Self::IfNTouch => "IF_N_TOUCH",
            Self::IfCo2 => "IF_CO2",
            Self::IfNCo2 => "IF_N_CO2",
            Self::IfLoEnergy => "IF_LO_ENERGY",
            Self::IfHiEnergy => "IF_HI_ENERGY",
            Self::Label => "LABEL",
            Self::Jump => "JUMP",
            Self::Reproduce => "REPRODUCE",
        }
    }
}

/// Which neighbor a reproducing parent overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementTarget {
    /// Replace the neighbor that has survived the longest.
    OldestNeighbor,
    /// Replace the neighbor with the smallest energy reserve.
    LowestEnergyNeighbor,
}

/// How energy is transferred from parent to offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationMethod {
    /// The offspring starts from zero.
    OnYourOwn,
    /// Parent and offspring each get half the parent's reserve.
    SplitEnergy,
}

/// Errors raised when validating a [`GridConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Static configuration for a GlowGrid world. Built once, validated at
/// construction; never mutated while the world runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Grid width in cells.
    pub grid_width: usize,
    /// Grid height in cells.
    pub grid_height: usize,
    /// Smallest executable genome a deletion may leave behind.
    pub exe_size_min: usize,
    /// Executable genome length of freshly seeded cells.
    pub exe_size_init: usize,
    /// Hard cap on executable genome length (also the variable-region
    /// offset inside the genome).
    pub exe_size_max: usize,
    /// Upper bound of the display-variable scale.
    pub max_var: u8,
    /// Per-slot probability of a copy mutation.
    pub mut_prob_copy: f32,
    /// Probability of one insertion mutation per offspring.
    pub mut_prob_insert: f32,
    /// Probability of one deletion mutation per offspring.
    pub mut_prob_delete: f32,
    /// Standard deviation of the Gaussian noise added to display variables.
    pub var_mutation_sigma: f32,
    /// Maximum energy a cell can hold.
    pub energy_max: f32,
    /// Energy cost of executing one instruction.
    pub energy_decay: f32,
    /// One-time reward for a touch detection.
    pub touch_energy: f32,
    /// One-time reward for a motion detection.
    pub motion_energy: f32,
    /// One-time reward for a CO2 detection.
    pub co2_energy: f32,
    /// Reward for a sound detection after a quiet spell.
    pub new_sound_energy: f32,
    /// Reward for a sound detection during continuous noise.
    pub normal_sound_energy: f32,
    /// Ticks a detection stays visible to the long-term sensor queries.
    pub long_term_duration: u32,
    /// Quiet ticks required before a sound counts as new again.
    pub new_sound_delay: u32,
    /// Chebyshev radius of a touch event.
    pub touch_range: u32,
    /// Chebyshev radius of a motion event.
    pub motion_range: u32,
    /// Chebyshev radius of a sound event.
    pub sound_range: u32,
    /// Chebyshev radius of a CO2 event.
    pub co2_range: u32,
    /// Paused steps both parties spend in the reproduction state.
    pub repro_countdown: u32,
    /// Reproduction probability at zero energy.
    pub repro_prob_min: f32,
    /// Reproduction probability at full energy.
    pub repro_prob_max: f32,
    /// Neighbor-selection policy for replacement.
    pub replacement_target: ReplacementTarget,
    /// Energy-transfer policy for replacement.
    pub replication_method: ReplicationMethod,
    /// Optional RNG seed for reproducible worlds.
    pub rng_seed: Option<u64>,
    /// Maximum number of recent tick summaries retained in-memory.
    pub history_capacity: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        // Copy rate of one expected hit per initial genome; structural rates
        // follow the Avida-derived ratio used by the exhibit.
        let mut_prob_copy = 1.0 / 10.0;
        Self {
            grid_width: 15,
            grid_height: 10,
            exe_size_min: 5,
            exe_size_init: 10,
            exe_size_max: 20,
            max_var: 255,
            mut_prob_copy,
            mut_prob_insert: mut_prob_copy / 2.2,
            mut_prob_delete: mut_prob_copy / 2.2,
            var_mutation_sigma: 20.0,
            energy_max: 100.0,
            energy_decay: 1.0,
            touch_energy: 50.0,
            motion_energy: 10.0,
            co2_energy: 1.0,
            new_sound_energy: 4.0,
            normal_sound_energy: 0.0,
            long_term_duration: 20,
            new_sound_delay: 1,
            touch_range: 0,
            motion_range: 0,
            sound_range: 1,
            co2_range: 2,
            repro_countdown: 3,
            repro_prob_min: 0.01,
            repro_prob_max: 0.10,
            replacement_target: ReplacementTarget::LowestEnergyNeighbor,
            replication_method: ReplicationMethod::SplitEnergy,
            rng_seed: None,
            history_capacity: 256,
        }
    }
}

impl GridConfig {
    /// Total genome length: executable capacity plus the variable region.
    #[must_use]
    pub const fn genome_capacity(&self) -> usize {
        self.exe_size_max + NUM_VARS
    }

    /// Validates every range in the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::Invalid("grid dimensions must be non-zero"));
        }
        if self.exe_size_min == 0 {
            return Err(ConfigError::Invalid("exe_size_min must be non-zero"));
        }
        if self.exe_size_min > self.exe_size_init || self.exe_size_init > self.exe_size_max {
            return Err(ConfigError::Invalid(
                "executable sizes must satisfy min <= init <= max",
            ));
        }
        if self.max_var == 0 {
            return Err(ConfigError::Invalid("max_var must be non-zero"));
        }
        for prob in [
            self.mut_prob_copy,
            self.mut_prob_insert,
            self.mut_prob_delete,
            self.repro_prob_min,
            self.repro_prob_max,
        ] {
            if !(0.0..=1.0).contains(&prob) {
                return Err(ConfigError::Invalid(
                    "probabilities must lie within [0, 1]",
                ));
            }
        }
        if self.repro_prob_min > self.repro_prob_max {
            return Err(ConfigError::Invalid(
                "repro_prob_min cannot exceed repro_prob_max",
            ));
        }
        if self.var_mutation_sigma < 0.0 {
            return Err(ConfigError::Invalid(
                "var_mutation_sigma must be non-negative",
            ));
        }
        if self.energy_max <= 0.0 {
            return Err(ConfigError::Invalid("energy_max must be positive"));
        }
        if self.energy_decay < 0.0
            || self.touch_energy < 0.0
            || self.motion_energy < 0.0
            || self.co2_energy < 0.0
            || self.new_sound_energy < 0.0
            || self.normal_sound_energy < 0.0
        {
            return Err(ConfigError::Invalid(
                "energy decay and rewards must be non-negative",
            ));
        }
        if self.long_term_duration == 0 {
            return Err(ConfigError::Invalid(
                "long_term_duration must be non-zero",
            ));
        }
        if self.new_sound_delay >= self.long_term_duration {
            return Err(ConfigError::Invalid(
                "new_sound_delay must be shorter than long_term_duration",
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be non-zero"));
        }
        Ok(())
    }

    /// Returns the configured RNG, seeded from entropy when no seed is set.
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }

    /// Default injection radius for the given sensor channel.
    #[must_use]
    pub const fn sensor_range(&self, kind: SensorKind) -> u32 {
        match kind {
            SensorKind::Touch => self.touch_range,
            SensorKind::Motion => self.motion_range,
            SensorKind::Sound => self.sound_range,
            SensorKind::Co2 => self.co2_range,
        }
    }
}

/// Standard Gaussian sample via the Box-Muller transform.
fn gaussian(rng: &mut SmallRng) -> f32 {
    let u1: f32 = rng.random::<f32>().max(f32::EPSILON);
    let u2: f32 = rng.random::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// An evolvable program: `exe_size` opcode slots followed (at the fixed
/// variable-region offset) by the display variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genome {
    code: Vec<u8>,
    exe_size: usize,
}

impl Genome {
    /// Seed a fresh random genome of `exe_size_init` instructions, repaired
    /// for viability, with uniformly random display variables.
    #[must_use]
    pub fn random(config: &GridConfig, rng: &mut SmallRng) -> Self {
        let mut genome = Self {
            code: vec![0; config.genome_capacity()],
            exe_size: config.exe_size_init,
        };
        for slot in &mut genome.code[..config.exe_size_init] {
            *slot = rng.random_range(0..Opcode::ALL.len()) as u8;
        }
        genome.ensure_viable(rng);
        for slot in &mut genome.code[config.exe_size_max..] {
            *slot = rng.random_range(0..config.max_var);
        }
        genome
    }

    /// Current executable length.
    #[must_use]
    pub const fn exe_size(&self) -> usize {
        self.exe_size
    }

    fn exe_capacity(&self) -> usize {
        self.code.len() - NUM_VARS
    }

    /// Decode the instruction at `pc`.
    #[must_use]
    pub fn opcode_at(&self, pc: usize) -> Opcode {
        Opcode::from_code(self.code[pc % self.exe_size])
    }

    /// Read one display variable.
    #[must_use]
    pub fn var(&self, slot: DisplaySlot) -> u8 {
        self.code[self.exe_capacity() + slot.index()]
    }

    fn set_var(&mut self, slot: DisplaySlot, value: u8) {
        let base = self.exe_capacity();
        self.code[base + slot.index()] = value;
    }

    /// Copy of the full variable region in slot order.
    #[must_use]
    pub fn variables(&self) -> [u8; NUM_VARS] {
        let mut vars = [0; NUM_VARS];
        vars.copy_from_slice(&self.code[self.exe_capacity()..]);
        vars
    }

    /// Whether the executable region carries at least one REPRODUCE.
    #[must_use]
    pub fn is_viable(&self) -> bool {
        self.code[..self.exe_size].contains(&Opcode::Reproduce.code())
    }

    /// Iterate the executable region as decoded opcodes.
    pub fn opcodes(&self) -> impl Iterator<Item = Opcode> + '_ {
        self.code[..self.exe_size].iter().map(|&c| Opcode::from_code(c))
    }

    /// Assembly-style listing of the executable region.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.opcodes()
            .map(Opcode::mnemonic)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Insert `code` at `index`, shifting the tail right. Fails (returning
    /// `false`) when the executable region is already at capacity.
    fn insert_opcode(&mut self, index: usize, code: u8) -> bool {
        if self.exe_size >= self.exe_capacity() {
            return false;
        }
        self.exe_size += 1;
        for i in ((index + 1)..self.exe_size).rev() {
            self.code[i] = self.code[i - 1];
        }
        self.code[index] = code;
        true
    }

    /// Remove the instruction at `index`, shifting the tail left.
    fn remove_opcode(&mut self, index: usize) {
        self.exe_size -= 1;
        for i in index..self.exe_size {
            self.code[i] = self.code[i + 1];
        }
    }

    /// Viability repair: a genome that lost its last REPRODUCE gets one
    /// back, by insertion at a random slot when there is room, otherwise by
    /// overwriting that slot.
    pub fn ensure_viable(&mut self, rng: &mut SmallRng) {
        if self.is_viable() {
            return;
        }
        let index = rng.random_range(0..self.exe_size);
        if !self.insert_opcode(index, Opcode::Reproduce.code()) {
            self.code[index] = Opcode::Reproduce.code();
        }
    }

    /// Expose the genome to one round of offspring mutations: deletion,
    /// per-slot copy mutations over instructions and variables, insertion,
    /// then viability repair.
    pub fn mutate(&mut self, config: &GridConfig, rng: &mut SmallRng) {
        // Deletion (never below the minimum instruction count).
        if rng.random::<f32>() < config.mut_prob_delete && self.exe_size > config.exe_size_min {
            let index = rng.random_range(0..self.exe_size);
            self.remove_opcode(index);
        }

        // Copy mutations over instructions.
        for i in 0..self.exe_size {
            if rng.random::<f32>() < config.mut_prob_copy {
                self.code[i] = rng.random_range(0..Opcode::ALL.len()) as u8;
            }
        }

        // Copy mutations over display variables: Gaussian drift, with hues
        // wrapping around the color circle and the rest clamping.
        let max_var = i32::from(config.max_var);
        let base = self.exe_capacity();
        for slot in 0..NUM_VARS {
            if rng.random::<f32>() < config.mut_prob_copy {
                let drift = (gaussian(rng) * config.var_mutation_sigma) as i32;
                let mut value = i32::from(self.code[base + slot]) + drift;
                if slot == DisplaySlot::Led0Hue.index() || slot == DisplaySlot::Led1Hue.index() {
                    value %= max_var;
                    if value < 0 {
                        value += max_var;
                    }
                } else {
                    if value > max_var {
                        value = max_var;
                    }
                    if value < 0 {
                        value = 0;
                    }
                }
                self.code[base + slot] = value as u8;
            }
        }

        // Insertion. Index and opcode are drawn unconditionally; the insert
        // fails silently at capacity.
        if rng.random::<f32>() < config.mut_prob_insert {
            let index = rng.random_range(0..self.exe_size);
            let code = rng.random_range(0..Opcode::ALL.len()) as u8;
            self.insert_opcode(index, code);
        }

        self.ensure_viable(rng);
    }
}

/// Population-level side effect requested by an opcode handler. Applied by
/// the scheduler once the cell borrow has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Broadcast,
    Reproduce,
}

/// One grid-resident organism: genome plus all runtime state.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    genome: Genome,
    pc: usize,
    label: Option<usize>,
    skip_next: bool,
    age: u32,
    energy: f32,
    repro_countdown: u32,
    alt_step: bool,
    is_offspring: bool,
    sensor_countdowns: [u32; NUM_SENSORS],
    display_current: DisplayFrame,
    display_previous: DisplayFrame,
    display_buffer: DisplayFrame,
    /// Message frame, serving as both inbox and outgoing broadcast payload.
    message: DisplayFrame,
}

impl Cell {
    fn fresh(config: &GridConfig, rng: &mut SmallRng) -> Self {
        let mut cell = Self {
            genome: Genome::random(config, rng),
            pc: 0,
            label: None,
            skip_next: false,
            age: 0,
            energy: 0.0,
            repro_countdown: 0,
            alt_step: false,
            is_offspring: false,
            sensor_countdowns: [0; NUM_SENSORS],
            display_current: DisplayFrame::default(),
            display_previous: DisplayFrame::default(),
            display_buffer: DisplayFrame::default(),
            message: DisplayFrame::default(),
        };
        cell.reset();
        cell
    }

    /// Clear all runtime state, buffers, sensors, and force the genome's
    /// actuator state flags off. Used at seeding and on replacement.
    fn reset(&mut self) {
        self.pc = 0;
        self.label = None;
        self.skip_next = false;
        self.age = 0;
        self.energy = 0.0;
        self.repro_countdown = 0;
        self.is_offspring = true;
        self.sensor_countdowns = [0; NUM_SENSORS];
        self.display_current = DisplayFrame::default();
        self.display_previous = DisplayFrame::default();
        self.display_buffer = DisplayFrame::default();
        self.message = DisplayFrame::default();
        self.genome.set_var(DisplaySlot::Led0State, VAR_OFF);
        self.genome.set_var(DisplaySlot::Led1State, VAR_OFF);
        self.genome.set_var(DisplaySlot::SpeakerState, VAR_OFF);
    }

    fn advance_pc(&mut self) {
        self.pc = (self.pc + 1) % self.genome.exe_size();
    }

    fn set_energy(&mut self, value: f32, energy_max: f32) {
        self.energy = value.clamp(0.0, energy_max);
    }

    fn add_energy(&mut self, delta: f32, energy_max: f32) {
        self.set_energy(self.energy + delta, energy_max);
    }

    /// Save the current frame as previous, then make `frame` current.
    fn set_display(&mut self, frame: DisplayFrame) {
        self.display_previous = self.display_current;
        self.display_current = frame;
    }

    /// Mark a detection on the given channel, paying the matching energy
    /// reward. Touch, motion, and CO2 reward only when not already detected
    /// this tick (and leave the countdown untouched in that case); sound
    /// always re-arms, with the reward depending on how quiet it has been.
    fn record_detection(&mut self, kind: SensorKind, config: &GridConfig) {
        match kind {
            SensorKind::Touch if !self.detection(SensorKind::Touch, Term::Short, config) => {
                self.add_energy(config.touch_energy, config.energy_max);
                self.sensor_countdowns[SensorKind::Touch.index()] = config.long_term_duration;
            }
            SensorKind::Motion if !self.detection(SensorKind::Motion, Term::Short, config) => {
                self.add_energy(config.motion_energy, config.energy_max);
                self.sensor_countdowns[SensorKind::Motion.index()] = config.long_term_duration;
            }
            SensorKind::Co2 if !self.detection(SensorKind::Co2, Term::Short, config) => {
                self.add_energy(config.co2_energy, config.energy_max);
                self.sensor_countdowns[SensorKind::Co2.index()] = config.long_term_duration;
            }
            SensorKind::Sound => {
                let countdown = self.sensor_countdowns[SensorKind::Sound.index()];
                if countdown < config.long_term_duration - config.new_sound_delay {
                    self.add_energy(config.new_sound_energy, config.energy_max);
                } else {
                    self.add_energy(config.normal_sound_energy, config.energy_max);
                }
                self.sensor_countdowns[SensorKind::Sound.index()] = config.long_term_duration;
            }
            _ => {}
        }
    }

    /// Whether the given channel detected activity within the given term.
    #[must_use]
    pub fn detection(&self, kind: SensorKind, term: Term, config: &GridConfig) -> bool {
        let countdown = self.sensor_countdowns[kind.index()];
        match term {
            Term::Short => countdown == config.long_term_duration,
            Term::Long => countdown != 0,
        }
    }

    /// Whether this cell is currently in the reproduction pause.
    #[must_use]
    pub const fn is_reproducing(&self) -> bool {
        self.repro_countdown > 0
    }

    /// Whether the reproduction pause belongs to an offspring (as opposed
    /// to a parent).
    #[must_use]
    pub const fn is_offspring(&self) -> bool {
        self.is_offspring
    }

    /// Steps survived since this cell was last replaced.
    #[must_use]
    pub const fn age(&self) -> u32 {
        self.age
    }

    /// Current energy reserve.
    #[must_use]
    pub const fn energy(&self) -> f32 {
        self.energy
    }

    /// Current program counter.
    #[must_use]
    pub const fn pc(&self) -> usize {
        self.pc
    }

    /// The cell's genome.
    #[must_use]
    pub const fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Value snapshot of the current display frame.
    #[must_use]
    pub const fn display(&self) -> DisplayFrame {
        self.display_current
    }

    /// Value snapshot of the previous display frame.
    #[must_use]
    pub const fn previous_display(&self) -> DisplayFrame {
        self.display_previous
    }

    /// Remaining ticks on one sensor countdown.
    #[must_use]
    pub const fn sensor_countdown(&self, kind: SensorKind) -> u32 {
        self.sensor_countdowns[kind.index()]
    }
}

impl Opcode {
    /// Apply this opcode to `cell`. Handlers mutate the cell only; effects
    /// that reach beyond it are returned for the scheduler to apply.
    fn execute(self, cell: &mut Cell, config: &GridConfig, rng: &mut SmallRng) -> Option<Effect> {
        match self {
            Self::Nop => None,
            Self::Led0On => {
                led_on(cell, LedId::Led0);
                None
            }
            Self::Led0Off => {
                led_off(cell, LedId::Led0);
                None
            }
            Self::Led0Toggle => {
                led_toggle(cell, LedId::Led0);
                None
            }
            Self::Led1On => {
                led_on(cell, LedId::Led1);
                None
            }
            Self::Led1Off => {
                led_off(cell, LedId::Led1);
                None
            }
            Self::Led1Toggle => {
                led_toggle(cell, LedId::Led1);
                None
            }
            Self::SpeakerOn => {
                let mut frame = cell.display_current;
                frame.set(
                    DisplaySlot::SpeakerIndex,
                    cell.genome.var(DisplaySlot::SpeakerIndex),
                );
                frame.set(DisplaySlot::SpeakerState, VAR_ON);
                cell.set_display(frame);
                None
            }
            Self::SpeakerOff => {
                let mut frame = cell.display_current;
                frame.set(DisplaySlot::SpeakerIndex, VAR_OFF);
                frame.set(DisplaySlot::SpeakerState, VAR_OFF);
                cell.set_display(frame);
                None
            }
            Self::BufferSetData => {
                cell.display_buffer = cell.display_current;
                None
            }
            Self::BufferGetData => {
                let frame = cell.display_buffer;
                cell.set_display(frame);
                None
            }
            Self::MessageSend => Some(Effect::Broadcast),
            Self::MessageRetrieve => {
                cell.display_buffer = cell.message;
                None
            }
            Self::IfMotion => {
                if !cell.detection(SensorKind::Motion, Term::Long, config) {
                    cell.skip_next = true;
                }
                None
            }
            Self::IfNMotion => {
                if cell.detection(SensorKind::Motion, Term::Long, config) {
                    cell.skip_next = true;
                }
                None
            }
            Self::IfSound => {
                if !cell.detection(SensorKind::Sound, Term::Long, config) {
                    cell.skip_next = true;
                }
                None
            }
            Self::IfNSound => {
                if cell.detection(SensorKind::Sound, Term::Long, config) {
                    cell.skip_next = true;
                }
                None
            }
            Self::IfTouch => {
                if !cell.detection(SensorKind::Touch, Term::Long, config) {
                    cell.skip_next = true;
                }
                None
            }
            Self::IfNTouch => {
                if cell.detection(SensorKind::Touch, Term::Long, config) {
                    cell.skip_next = true;
                }
                None
            }
            Self::IfCo2 => {
                if !cell.detection(SensorKind::Co2, Term::Long, config) {
                    cell.skip_next = true;
                }
                None
            }
            Self::IfNCo2 => {
                if cell.detection(SensorKind::Co2, Term::Long, config) {
                    cell.skip_next = true;
                }
                None
            }
            // The energy conditionals skip when the named condition holds,
            // unlike the sensor conditionals. Long-standing exhibit
            // behavior; genomes evolved against it.
            Self::IfLoEnergy => {
                if cell.energy < config.energy_max / 2.0 {
                    cell.skip_next = true;
                }
                None
            }
            Self::IfHiEnergy => {
                if cell.energy >= config.energy_max / 2.0 {
                    cell.skip_next = true;
                }
                None
            }
            Self::Label => {
                cell.label = Some(cell.pc);
                None
            }
            Self::Jump => {
                // Without a recorded label the jump lands on the last slot,
                // so the end-of-step increment wraps to the genome start.
                cell.pc = match cell.label {
                    Some(label) => label,
                    None => cell.genome.exe_size() - 1,
                };
                None
            }
            Self::Reproduce => {
                let span = config.repro_prob_max - config.repro_prob_min;
                let prob = cell.energy / config.energy_max * span + config.repro_prob_min;
                if prob > rng.random::<f32>() {
                    Some(Effect::Reproduce)
                } else {
                    None
                }
            }
        }
    }
}

fn led_on(cell: &mut Cell, led: LedId) {
    let [hue, sat, bright, state] = led.slots();
    let mut frame = cell.display_current;
    frame.set(hue, cell.genome.var(hue));
    frame.set(sat, cell.genome.var(sat));
    frame.set(bright, cell.genome.var(bright));
    frame.set(state, VAR_ON);
    cell.set_display(frame);
}

fn led_off(cell: &mut Cell, led: LedId) {
    let mut frame = cell.display_current;
    for slot in led.slots() {
        frame.set(slot, VAR_OFF);
    }
    cell.set_display(frame);
}

fn led_toggle(cell: &mut Cell, led: LedId) {
    let mut frame = cell.display_current;
    let previous = cell.display_previous;
    for slot in led.slots() {
        frame.set(slot, previous.get(slot));
    }
    cell.set_display(frame);
}

/// The toroidal grid of cells, with neighbor lookup, broadcast delivery,
/// and the reproduction/replacement protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Population {
    fn new(config: &GridConfig, rng: &mut SmallRng) -> Self {
        let count = config.grid_width * config.grid_height;
        let mut cells = Vec::with_capacity(count);
        for _ in 0..count {
            cells.push(Cell::fresh(config, rng));
        }
        Self {
            width: config.grid_width,
            height: config.grid_height,
            cells,
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Borrow one cell, if the coordinates are on the grid.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.width && y < self.height {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// The 8 Moore-adjacent coordinates of `(x, y)` under toroidal
    /// wraparound. Coordinates that wrap back onto the origin itself (on
    /// degenerate grid sizes) are excluded.
    #[must_use]
    pub fn neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(8);
        for dx in [-1_i64, 0, 1] {
            for dy in [-1_i64, 0, 1] {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = (x as i64 + dx).rem_euclid(self.width as i64) as usize;
                let ny = (y as i64 + dy).rem_euclid(self.height as i64) as usize;
                if nx == x && ny == y {
                    continue;
                }
                out.push((nx, ny));
            }
        }
        out
    }

    /// Deliver the sender's message frame into every neighbor's message
    /// frame, overwriting whatever was pending there.
    fn broadcast(&mut self, x: usize, y: usize) {
        let message = self.cells[self.index(x, y)].message;
        for (nx, ny) in self.neighbors(x, y) {
            let idx = self.index(nx, ny);
            self.cells[idx].message = message;
        }
    }

    /// The replacement protocol: pick the extreme-scoring neighbor that is
    /// not mid-reproduction (uniform among ties), overwrite it with a
    /// mutated copy of the parent genome, and apply the energy-transfer
    /// policy. Returns `false`, changing nothing, when every neighbor is
    /// mid-reproduction.
    fn reproduce(
        &mut self,
        parent: (usize, usize),
        parent_alt_step: bool,
        config: &GridConfig,
        rng: &mut SmallRng,
    ) -> bool {
        let mut candidates: Vec<(usize, usize)> = Vec::with_capacity(8);
        match config.replacement_target {
            ReplacementTarget::OldestNeighbor => {
                let mut best: Option<u32> = None;
                for (nx, ny) in self.neighbors(parent.0, parent.1) {
                    let cell = &self.cells[self.index(nx, ny)];
                    if cell.is_reproducing() {
                        continue;
                    }
                    match best {
                        Some(age) if cell.age < age => {}
                        Some(age) if cell.age == age => candidates.push((nx, ny)),
                        _ => {
                            candidates.clear();
                            candidates.push((nx, ny));
                            best = Some(cell.age);
                        }
                    }
                }
            }
            ReplacementTarget::LowestEnergyNeighbor => {
                let mut best: Option<OrderedFloat<f32>> = None;
                for (nx, ny) in self.neighbors(parent.0, parent.1) {
                    let cell = &self.cells[self.index(nx, ny)];
                    if cell.is_reproducing() {
                        continue;
                    }
                    let score = OrderedFloat(cell.energy);
                    match best {
                        Some(current) if score > current => {}
                        Some(current) if score == current => candidates.push((nx, ny)),
                        _ => {
                            candidates.clear();
                            candidates.push((nx, ny));
                            best = Some(score);
                        }
                    }
                }
            }
        }

        if candidates.is_empty() {
            return false;
        }
        let (tx, ty) = candidates[rng.random_range(0..candidates.len())];

        let parent_idx = self.index(parent.0, parent.1);
        let target_idx = self.index(tx, ty);
        let parent_genome = self.cells[parent_idx].genome.clone();
        let parent_energy = self.cells[parent_idx].energy;

        let offspring = &mut self.cells[target_idx];
        offspring.genome = parent_genome;
        offspring.reset();
        offspring.genome.mutate(config, rng);
        // Keep parent and offspring pauses in sync despite the randomized
        // visitation order: an offspring that has not stepped yet this tick
        // will burn one extra decrement before the tick ends.
        offspring.repro_countdown = if offspring.alt_step == parent_alt_step {
            config.repro_countdown
        } else {
            config.repro_countdown + 1
        };

        match config.replication_method {
            ReplicationMethod::SplitEnergy => {
                let half = parent_energy / 2.0;
                self.cells[target_idx].set_energy(half, config.energy_max);
                self.cells[parent_idx].set_energy(half, config.energy_max);
            }
            ReplicationMethod::OnYourOwn => {}
        }
        true
    }
}

/// High level simulation clock (ticks processed since boot).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Resets the tick counter back to zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

/// Aggregate statistics recorded at the end of every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: Tick,
    /// Successful reproduction events this tick.
    pub births: usize,
    pub total_energy: f32,
    pub average_energy: f32,
    pub average_age: f32,
}

/// Read-only point-in-time copy of one cell's externally visible state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub x: usize,
    pub y: usize,
    pub display_current: DisplayFrame,
    pub display_previous: DisplayFrame,
    pub energy: f32,
    pub age: u32,
    pub is_reproducing: bool,
    pub is_offspring: bool,
    /// Assembly-style listing of the executable genome.
    pub genome_text: String,
    /// Long-term detection flag per sensor, in [`SensorKind::ALL`] order.
    pub sensor_flags: [bool; NUM_SENSORS],
}

/// Optional selection targets for the global color pressure mode. While at
/// least one target is set, end-of-tick fitness overwrites every cell's
/// energy from its displayed color distance, and interactive sensor
/// rewards are suspended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PressureTargets {
    pub led0: Option<HsbColor>,
    pub led1: Option<HsbColor>,
}

impl PressureTargets {
    /// Whether any pressure target is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.led0.is_some() || self.led1.is_some()
    }

    const fn active_count(&self) -> usize {
        self.led0.is_some() as usize + self.led1.is_some() as usize
    }
}

/// Euclidean HSB distance with circular hue: a hue difference can only be
/// as large as half the scale, and is doubled to preserve weight against
/// saturation and brightness.
#[must_use]
pub fn hsb_distance(color: HsbColor, target: HsbColor, max_var: f32) -> f32 {
    let mut dh = target.hue - color.hue;
    let ds = target.saturation - color.saturation;
    let db = target.brightness - color.brightness;
    if dh.abs() > max_var / 2.0 {
        dh = max_var - dh.abs();
    }
    dh *= 2.0;
    (dh * dh + ds * ds + db * db).sqrt()
}

/// The whole simulation: population, scheduler, RNG, and tick history.
pub struct World {
    config: GridConfig,
    rng: SmallRng,
    population: Population,
    tick: Tick,
    births: usize,
    pressure: PressureTargets,
    history: VecDeque<TickSummary>,
    visit_order: Vec<(usize, usize)>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("tick", &self.tick)
            .field("pressure", &self.pressure)
            .field("cell_count", &self.population.cells.len())
            .finish()
    }
}

impl World {
    /// Instantiate a new world using the supplied configuration. Every
    /// invalid configuration value is rejected here, never at tick time.
    pub fn new(config: GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = config.seeded_rng();
        let population = Population::new(&config, &mut rng);
        Ok(Self {
            history: VecDeque::with_capacity(config.history_capacity),
            config,
            rng,
            population,
            tick: Tick::zero(),
            births: 0,
            pressure: PressureTargets::default(),
            visit_order: Vec::new(),
        })
    }

    /// Returns an immutable reference to configuration.
    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Read-only access to the population grid.
    #[must_use]
    pub const fn population(&self) -> &Population {
        &self.population
    }

    /// Borrow one cell, if the coordinates are on the grid.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.population.get(x, y)
    }

    /// Currently active pressure targets.
    #[must_use]
    pub const fn pressure(&self) -> PressureTargets {
        self.pressure
    }

    /// Set or clear the global pressure target for one LED. Takes effect at
    /// the next tick boundary.
    pub fn set_pressure_target(&mut self, led: LedId, target: Option<HsbColor>) {
        match led {
            LedId::Led0 => self.pressure.led0 = target,
            LedId::Led1 => self.pressure.led1 = target,
        }
    }

    /// Iterate over retained tick summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TickSummary> {
        self.history.iter()
    }

    /// Advance the whole population by one instruction-cycle: step every
    /// cell once in a fresh random order, then apply the end-of-tick
    /// grid-wide effects.
    pub fn advance_tick(&mut self) -> TickSummary {
        self.births = 0;

        let mut order = std::mem::take(&mut self.visit_order);
        order.clear();
        for y in 0..self.population.height {
            for x in 0..self.population.width {
                order.push((x, y));
            }
        }
        order.shuffle(&mut self.rng);
        for &(x, y) in &order {
            self.step_cell(x, y);
        }
        self.visit_order = order;

        if self.pressure.is_active() {
            self.apply_color_pressure();
        } else {
            self.apply_speaker_sound();
        }

        self.tick = self.tick.next();
        self.record_summary()
    }

    /// Step one cell through a single instruction-cycle.
    fn step_cell(&mut self, x: usize, y: usize) {
        let idx = self.population.index(x, y);
        let effect = {
            let cell = &mut self.population.cells[idx];
            cell.alt_step = !cell.alt_step;

            // A reproducing cell burns the pause instead of executing.
            if cell.repro_countdown > 0 {
                cell.repro_countdown -= 1;
                return;
            }

            cell.add_energy(-self.config.energy_decay, self.config.energy_max);

            // A pending skip from last step's conditional consumes one slot
            // before dispatch.
            if cell.skip_next {
                cell.skip_next = false;
                cell.advance_pc();
            }

            let opcode = cell.genome.opcode_at(cell.pc);
            opcode.execute(cell, &self.config, &mut self.rng)
        };

        match effect {
            Some(Effect::Broadcast) => self.population.broadcast(x, y),
            Some(Effect::Reproduce) => {
                let parent_alt_step = self.population.cells[idx].alt_step;
                if self
                    .population
                    .reproduce((x, y), parent_alt_step, &self.config, &mut self.rng)
                {
                    let parent = &mut self.population.cells[idx];
                    parent.repro_countdown = self.config.repro_countdown;
                    parent.is_offspring = false;
                    self.births += 1;
                }
            }
            None => {}
        }

        let cell = &mut self.population.cells[idx];
        for countdown in &mut cell.sensor_countdowns {
            if *countdown > 0 {
                *countdown -= 1;
            }
        }
        cell.age += 1;
        cell.advance_pc();
    }

    /// Mark a detection over the Chebyshev ball of `radius` around
    /// `(x, y)`, clipped at the grid edges. Cells mid-reproduction do not
    /// sense; the whole event is ignored while a pressure target is active.
    pub fn inject_sensor_event(&mut self, x: usize, y: usize, kind: SensorKind, radius: u32) {
        if self.pressure.is_active() {
            return;
        }
        let radius = i64::from(radius);
        for i in (x as i64 - radius)..=(x as i64 + radius) {
            for j in (y as i64 - radius)..=(y as i64 + radius) {
                if i < 0
                    || i >= self.population.width as i64
                    || j < 0
                    || j >= self.population.height as i64
                {
                    continue;
                }
                let idx = self.population.index(i as usize, j as usize);
                let cell = &mut self.population.cells[idx];
                if cell.is_reproducing() {
                    continue;
                }
                cell.record_detection(kind, &self.config);
            }
        }
    }

    /// End-of-tick interactive effect: every cell with its speaker on
    /// triggers a sound detection around itself (its own sensor included).
    fn apply_speaker_sound(&mut self) {
        let mut sources = Vec::new();
        for y in 0..self.population.height {
            for x in 0..self.population.width {
                let cell = &self.population.cells[self.population.index(x, y)];
                if cell.display_current.speaker_on() && !cell.is_reproducing() {
                    sources.push((x, y));
                }
            }
        }
        let range = self.config.sound_range;
        for (x, y) in sources {
            self.inject_sensor_event(x, y, SensorKind::Sound, range);
        }
    }

    /// End-of-tick pressure effect: overwrite every cell's energy with a
    /// fitness inversely proportional to the HSB distance between its lit
    /// LEDs and the active targets. An unlit LED earns nothing.
    fn apply_color_pressure(&mut self) {
        let pressure = self.pressure;
        let active = pressure.active_count() as f32;
        let max_var = f32::from(self.config.max_var);
        let max_dist = (3.0 * max_var * max_var).sqrt();
        for cell in &mut self.population.cells {
            let mut reward = 0.0;
            for (led, target) in [(LedId::Led0, pressure.led0), (LedId::Led1, pressure.led1)] {
                let Some(target) = target else { continue };
                if !cell.display_current.led_on(led) {
                    continue;
                }
                let distance = hsb_distance(cell.display_current.led_color(led), target, max_var);
                reward += (max_dist - distance) / max_dist * self.config.energy_max / active;
            }
            cell.set_energy(reward, self.config.energy_max);
        }
    }

    fn record_summary(&mut self) -> TickSummary {
        let count = self.population.cells.len();
        let total_energy: f32 = self.population.cells.iter().map(|c| c.energy).sum();
        let total_age: u64 = self.population.cells.iter().map(|c| u64::from(c.age)).sum();
        let summary = TickSummary {
            tick: self.tick,
            births: self.births,
            total_energy,
            average_energy: total_energy / count as f32,
            average_age: total_age as f32 / count as f32,
        };
        if self.history.len() == self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary);
        summary
    }

    /// Read-only point-in-time copy of one cell.
    #[must_use]
    pub fn snapshot(&self, x: usize, y: usize) -> Option<CellSnapshot> {
        let cell = self.population.get(x, y)?;
        let mut sensor_flags = [false; NUM_SENSORS];
        for kind in SensorKind::ALL {
            sensor_flags[kind.index()] = cell.detection(kind, Term::Long, &self.config);
        }
        Some(CellSnapshot {
            x,
            y,
            display_current: cell.display_current,
            display_previous: cell.display_previous,
            energy: cell.energy,
            age: cell.age,
            is_reproducing: cell.is_reproducing(),
            is_offspring: cell.is_offspring,
            genome_text: cell.genome.to_text(),
            sensor_flags,
        })
    }

    /// Replace every cell with a freshly seeded one and restart the clock.
    /// A seed reseeds the RNG first, making the new population
    /// reproducible.
    pub fn reset_population(&mut self, seed: Option<u64>) {
        if let Some(seed) = seed {
            self.rng = SmallRng::seed_from_u64(seed);
        }
        self.population = Population::new(&self.config, &mut self.rng);
        self.tick = Tick::zero();
        self.births = 0;
        self.history.clear();
    }

    /// Bulk-overwrite every cell's energy (the de-energize control).
    pub fn set_energy_all(&mut self, value: f32) {
        for cell in &mut self.population.cells {
            cell.set_energy(value, self.config.energy_max);
        }
    }
}
