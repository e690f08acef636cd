//! Animation capability: параметры аниматора + intents (trigger / play)
//!
//! Core не проигрывает клипы. Он пишет параметры в `Animator` и шлёт
//! `AnimationIntent`; host пробрасывает их в свой animation graph.
//! Обратный канал (impact moment атаки): событие `AttackImpact`.

use std::collections::HashMap;

use bevy::prelude::*;

/// Значение параметра аниматора
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimParam {
    Bool(bool),
    Float(f32),
    Int(i32),
}

/// Handle аниматора (typed handle вместо поиска по имени)
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Animator {
    /// Выключен пока entity в ragdoll
    pub enabled: bool,
    parameters: HashMap<String, AnimParam>,
    /// Последний trigger / play tag (headless: для проверок)
    last_trigger: Option<String>,
    current_clip: Option<String>,
}

impl Default for Animator {
    fn default() -> Self {
        Self {
            enabled: true,
            parameters: HashMap::new(),
            last_trigger: None,
            current_clip: None,
        }
    }
}

impl Animator {
    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.parameters.insert(name.to_string(), AnimParam::Bool(value));
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.parameters.insert(name.to_string(), AnimParam::Float(value));
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.parameters.insert(name.to_string(), AnimParam::Int(value));
    }

    pub fn parameter(&self, name: &str) -> Option<AnimParam> {
        self.parameters.get(name).copied()
    }

    pub fn bool(&self, name: &str) -> bool {
        matches!(self.parameter(name), Some(AnimParam::Bool(true)))
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.parameter(name) {
            Some(AnimParam::Float(value)) => Some(value),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.parameter(name) {
            Some(AnimParam::Int(value)) => Some(value),
            _ => None,
        }
    }

    pub fn last_trigger(&self) -> Option<&str> {
        self.last_trigger.as_deref()
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.current_clip.as_deref()
    }
}

/// Что попросить у аниматора
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationCommand {
    /// Trigger параметр (например "Attack")
    Trigger(String),
    /// Проиграть clip/state по тегу (например recovery "StandUp")
    Play(String),
}

/// Event: intent для animation collaborator
#[derive(Event, Debug, Clone, PartialEq)]
pub struct AnimationIntent {
    pub entity: Entity,
    pub command: AnimationCommand,
}

impl AnimationIntent {
    pub fn trigger(entity: Entity, name: &str) -> Self {
        Self {
            entity,
            command: AnimationCommand::Trigger(name.to_string()),
        }
    }

    pub fn play(entity: Entity, tag: &str) -> Self {
        Self {
            entity,
            command: AnimationCommand::Play(tag.to_string()),
        }
    }
}

/// Система: headless animation collaborator (записывает intents в Animator)
///
/// Выключенный аниматор intents игнорирует.
pub fn apply_animation_intents(
    mut intents: EventReader<AnimationIntent>,
    mut animators: Query<&mut Animator>,
) {
    for intent in intents.read() {
        let Ok(mut animator) = animators.get_mut(intent.entity) else {
            continue;
        };

        if !animator.enabled {
            continue;
        }

        match &intent.command {
            AnimationCommand::Trigger(name) => animator.last_trigger = Some(name.clone()),
            AnimationCommand::Play(tag) => animator.current_clip = Some(tag.clone()),
        }
    }
}
