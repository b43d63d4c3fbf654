//! The named random-value generator catalogue consulted by `gen`
//! arguments.
//!
//! This catalogue is treated as an external collaborator the core
//! consumes by name; this module ships a small set of concrete
//! generators so the crate is runnable end to end without an integrator
//! supplying their own, and serves as the seam such an integrator would
//! extend via [`GeneratorCatalogue::register`].

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::value::Value;

pub type GeneratorFn = fn() -> Value;

pub struct GeneratorCatalogue {
    generators: HashMap<&'static str, GeneratorFn>,
}

impl GeneratorCatalogue {
    pub fn builtin() -> Self {
        let mut generators: HashMap<&'static str, GeneratorFn> = HashMap::new();
        generators.insert("uuid", gen_uuid);
        generators.insert("email", gen_email);
        generators.insert("name", gen_name);
        generators.insert("word", gen_word);
        generators.insert("bool", gen_bool);
        Self { generators }
    }

    pub fn register(&mut self, name: &'static str, f: GeneratorFn) {
        self.generators.insert(name, f);
    }

    pub fn get(&self, name: &str) -> Option<GeneratorFn> {
        self.generators.get(name).copied()
    }
}

impl Default for GeneratorCatalogue {
    fn default() -> Self {
        Self::builtin()
    }
}

const FIRST_NAMES: &[&str] = &["ada", "grace", "alan", "linus", "margaret", "dennis", "barbara"];
const LAST_NAMES: &[&str] = &["lovelace", "hopper", "turing", "torvalds", "hamilton", "ritchie", "liskov"];
const WORDS: &[&str] = &["widget", "gadget", "gizmo", "contraption", "device", "apparatus"];

fn gen_uuid() -> Value {
    Value::Text(uuid::Uuid::new_v4().to_string())
}

fn gen_name() -> Value {
    let mut rng = rand::thread_rng();
    let first = FIRST_NAMES.choose(&mut rng).unwrap();
    let last = LAST_NAMES.choose(&mut rng).unwrap();
    Value::Text(format!("{first} {last}"))
}

fn gen_email() -> Value {
    let mut rng = rand::thread_rng();
    let first = FIRST_NAMES.choose(&mut rng).unwrap();
    let n: u32 = rng.gen_range(0..10_000);
    Value::Text(format!("{first}{n}@example.com"))
}

fn gen_word() -> Value {
    let mut rng = rand::thread_rng();
    Value::Text((*WORDS.choose(&mut rng).unwrap()).to_string())
}

fn gen_bool() -> Value {
    Value::Bool(rand::thread_rng().gen())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalogue_has_expected_names() {
        let cat = GeneratorCatalogue::builtin();
        for name in ["uuid", "email", "name", "word", "bool"] {
            assert!(cat.get(name).is_some(), "missing generator {name}");
        }
        assert!(cat.get("nonexistent").is_none());
    }

    #[test]
    fn uuid_generator_produces_distinct_valid_uuids() {
        let a = gen_uuid();
        let b = gen_uuid();
        assert_ne!(a, b);
        let Value::Text(s) = &a else { panic!("expected text value") };
        assert!(uuid::Uuid::parse_str(s).is_ok());
    }

    #[test]
    fn register_adds_a_generator() {
        let mut cat = GeneratorCatalogue::builtin();
        fn gen_fixed() -> Value {
            Value::Int(42)
        }
        cat.register("fixed", gen_fixed);
        assert_eq!(cat.get("fixed").unwrap()(), Value::Int(42));
    }
}
