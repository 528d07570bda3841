use super::{
    entity::{Component, ComponentKind, EntityDesc, EntityId},
    math::Vector2F,
    world::{World, WorldError},
};

/// Opaque host-side reference to a loaded sound.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u32);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sound {
    pub handle: SoundHandle,
    /// Length of one playback in seconds.
    pub duration: f32,
}

/// Drained by the host, which owns the audio device.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AudioCommand {
    /// `channel` of `None` lets the host pick a free one. `loops` counts extra
    /// repetitions, negative loops forever.
    Play { player: EntityId, sound: SoundHandle, channel: Option<i32>, loops: i32 },
    Stop { player: EntityId, sound: SoundHandle },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioPlayer {
    sound: Sound,
    time_remaining: f32,
    playing: bool,
    looping: bool,
    destroy_on_end: bool,
}

impl AudioPlayer {
    pub fn new(sound: Sound) -> Self {
        Self {
            sound,
            time_remaining: 0.0,
            playing: false,
            looping: false,
            destroy_on_end: false,
        }
    }

    pub fn sound(&self) -> Sound {
        self.sound
    }

    pub fn duration(&self) -> f32 {
        self.sound.duration
    }

    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Playing with infinite loops, never finishes on its own.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn destroy_on_end(&self) -> bool {
        self.destroy_on_end
    }

    fn start(&mut self, loops: i32) {
        self.looping = loops < 0;
        self.time_remaining = if self.looping {
            1.0
        } else {
            self.sound.duration * (loops + 1) as f32
        };
        self.playing = true;
    }

    fn stop(&mut self) {
        self.time_remaining = 0.0;
        self.playing = false;
        self.looping = false;
    }

    /// Counts down the playback, returns `true` on the frame the sound ends.
    fn advance(&mut self, delta_time: f32) -> bool {
        if !self.playing || self.looping {
            return false;
        }
        self.time_remaining -= delta_time;
        if self.time_remaining <= 0.0 {
            self.playing = false;
            return true;
        }
        false
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AudioPlayerDesc {
    pub sound: Sound,
    pub play_on_start: bool,
    /// Destroy the player entity when its sound finishes.
    pub destroy_on_end: bool,
}

impl AudioPlayerDesc {
    pub fn new(sound: Sound) -> Self {
        Self {
            sound,
            play_on_start: false,
            destroy_on_end: false,
        }
    }

    pub fn play_on_start(mut self) -> Self {
        self.play_on_start = true;
        self
    }

    pub fn destroy_on_end(mut self) -> Self {
        self.destroy_on_end = true;
        self
    }
}

impl World {
    /// Creates an audio player entity under `parent`.
    pub fn add_audio_player(&mut self, parent: EntityId, desc: AudioPlayerDesc) -> Result<EntityId, WorldError> {
        let mut player = AudioPlayer::new(desc.sound);
        player.destroy_on_end = desc.destroy_on_end;
        let position = self.position(parent).ok_or(WorldError::EntityNotExist)?;
        let player_id = self.spawn(parent, EntityDesc::new(position, Vector2F::ONE), Component::AudioPlayer(player))?;
        if desc.play_on_start {
            self.play_audio(player_id, None, 0)?;
        }
        Ok(player_id)
    }

    pub fn audio_player(&self, player: EntityId) -> Option<&AudioPlayer> {
        match self.get_entity_by_id(player)?.component() {
            Component::AudioPlayer(audio_player) => Some(audio_player),
            _ => None,
        }
    }

    fn audio_player_mut(&mut self, player: EntityId) -> Result<&mut AudioPlayer, WorldError> {
        let entity = self.get_entity_by_id_mut(player).ok_or(WorldError::EntityNotExist)?;
        match &mut entity.component {
            Component::AudioPlayer(audio_player) => Ok(audio_player),
            _ => Err(WorldError::NotAComponent(ComponentKind::AudioPlayer)),
        }
    }

    /// Starts the sound from the beginning.
    pub fn play_audio(&mut self, player: EntityId, channel: Option<i32>, loops: i32) -> Result<(), WorldError> {
        let audio_player = self.audio_player_mut(player)?;
        audio_player.start(loops);
        let sound = audio_player.sound.handle;
        self.audio_commands.push(AudioCommand::Play { player, sound, channel, loops });
        Ok(())
    }

    pub fn halt_audio(&mut self, player: EntityId) -> Result<(), WorldError> {
        let audio_player = self.audio_player_mut(player)?;
        audio_player.stop();
        let sound = audio_player.sound.handle;
        self.audio_commands.push(AudioCommand::Stop { player, sound });
        Ok(())
    }

    pub fn set_destroy_on_end(&mut self, player: EntityId, destroy: bool) -> Result<(), WorldError> {
        self.audio_player_mut(player)?.destroy_on_end = destroy;
        Ok(())
    }

    pub(crate) fn step_audio_player(&mut self, player: EntityId) {
        let delta_time = self.delta_time;
        let Ok(audio_player) = self.audio_player_mut(player) else {
            return;
        };
        if !audio_player.advance(delta_time) {
            return;
        }
        if audio_player.destroy_on_end {
            log::debug!("Audio player {player} finished, destroying");
            if let Err(e) = self.remove_entity(player) {
                log::warn!("Could not destroy audio player {player}: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEEP: Sound = Sound { handle: SoundHandle(7), duration: 0.5 };

    fn player(world: &mut World, desc: AudioPlayerDesc) -> EntityId {
        let root = world.root();
        world.add_audio_player(root, desc).unwrap()
    }

    #[test]
    fn test_play_queues_command_and_sets_remaining_time() {
        let mut world = World::default();
        let id = player(&mut world, AudioPlayerDesc::new(BEEP));
        assert!(!world.audio_player(id).unwrap().is_playing());

        world.play_audio(id, Some(2), 1).unwrap();

        let audio_player = world.audio_player(id).unwrap();
        assert!(audio_player.is_playing());
        assert_eq!(audio_player.time_remaining(), 1.0);
        assert_eq!(world.take_audio_commands(), vec![AudioCommand::Play { player: id, sound: SoundHandle(7), channel: Some(2), loops: 1 }]);
        assert!(world.take_audio_commands().is_empty());
    }

    #[test]
    fn test_play_on_start() {
        let mut world = World::default();
        let id = player(&mut world, AudioPlayerDesc::new(BEEP).play_on_start());
        assert!(world.audio_player(id).unwrap().is_playing());
        assert_eq!(world.take_audio_commands().len(), 1);
    }

    #[test]
    fn test_playback_stops_after_duration() {
        let mut world = World::default();
        let id = player(&mut world, AudioPlayerDesc::new(BEEP).play_on_start());

        world.tick(0.3);
        assert!(world.audio_player(id).unwrap().is_playing());
        world.tick(0.3);
        assert!(!world.audio_player(id).unwrap().is_playing());
        assert!(world.is_alive(id));
    }

    #[test]
    fn test_destroy_on_end_removes_player() {
        let mut world = World::default();
        let id = player(&mut world, AudioPlayerDesc::new(BEEP).play_on_start().destroy_on_end());

        world.tick(0.25);
        assert!(world.is_alive(id));
        world.tick(0.25);
        assert!(!world.is_alive(id));
    }

    #[test]
    fn test_infinite_loop_never_finishes() {
        let mut world = World::default();
        let id = player(&mut world, AudioPlayerDesc::new(BEEP).destroy_on_end());
        world.play_audio(id, None, -1).unwrap();

        for _ in 0..10 {
            world.tick(1.0);
        }
        let audio_player = world.audio_player(id).unwrap();
        assert!(audio_player.is_playing());
        assert!(audio_player.is_looping());
    }

    #[test]
    fn test_halt_stops_and_queues_stop() {
        let mut world = World::default();
        let id = player(&mut world, AudioPlayerDesc::new(BEEP).destroy_on_end());
        world.play_audio(id, None, -1).unwrap();
        world.halt_audio(id).unwrap();

        let audio_player = world.audio_player(id).unwrap();
        assert!(!audio_player.is_playing());
        assert_eq!(audio_player.time_remaining(), 0.0);
        assert_eq!(world.take_audio_commands().last(), Some(&AudioCommand::Stop { player: id, sound: SoundHandle(7) }));

        world.tick(1.0);
        assert!(world.is_alive(id));
    }

    #[test]
    fn test_play_on_plain_entity_fails() {
        let mut world = World::default();
        let root = world.root();
        assert!(matches!(world.play_audio(root, None, 0), Err(WorldError::NotAComponent(_))));
    }
}
