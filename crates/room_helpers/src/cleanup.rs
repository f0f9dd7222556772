use bevy::prelude::*;

/// Despawns every entity carrying the marker `T`, children included.
pub fn despawn_marked<T: Component>(mut commands: Commands, query: Query<Entity, With<T>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

/// Removes a per-screen resource on exit.
pub fn remove_resource<R: Resource>(mut commands: Commands) {
    commands.remove_resource::<R>();
}
