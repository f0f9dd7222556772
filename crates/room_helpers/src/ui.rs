use bevy::prelude::*;

pub const BUTTON_IDLE: Color = Color::srgb(0.15, 0.15, 0.2);
pub const BUTTON_HOVERED: Color = Color::srgb(0.25, 0.25, 0.35);
pub const BUTTON_PRESSED: Color = Color::srgb(0.35, 0.6, 0.35);

pub struct ButtonStylePlugin;

impl Plugin for ButtonStylePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, highlight_buttons);
    }
}

/// Full-screen column that centers its children, used as the root of menus.
pub fn centered_column() -> Node {
    Node {
        width: Val::Percent(100.0),
        height: Val::Percent(100.0),
        flex_direction: FlexDirection::Column,
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        row_gap: Val::Px(16.0),
        ..default()
    }
}

pub fn spawn_title(parent: &mut ChildBuilder, text: impl Into<String>, font_size: f32) {
    parent.spawn((
        Text::new(text),
        TextFont {
            font_size,
            ..default()
        },
        TextColor(Color::WHITE),
        TextLayout::new_with_justify(JustifyText::Center),
    ));
}

/// Spawns a labelled button carrying `action` so a single system can react
/// to every button of a screen.
pub fn spawn_button<A: Component>(parent: &mut ChildBuilder, label: impl Into<String>, action: A) {
    parent
        .spawn((
            Button,
            Node {
                min_width: Val::Px(220.0),
                padding: UiRect::axes(Val::Px(24.0), Val::Px(12.0)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(BUTTON_IDLE),
            action,
        ))
        .with_child((
            Text::new(label),
            TextFont {
                font_size: 28.0,
                ..default()
            },
            TextColor(Color::WHITE),
        ));
}

const fn button_color(interaction: Interaction) -> Color {
    match interaction {
        Interaction::Pressed => BUTTON_PRESSED,
        Interaction::Hovered => BUTTON_HOVERED,
        Interaction::None => BUTTON_IDLE,
    }
}

fn highlight_buttons(
    mut buttons: Query<(&Interaction, &mut BackgroundColor), (Changed<Interaction>, With<Button>)>,
) {
    for (interaction, mut background) in &mut buttons {
        background.0 = button_color(*interaction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hovered_button_changes_color() {
        let mut world = World::new();
        let button = world
            .spawn((Button, Interaction::Hovered, BackgroundColor(BUTTON_IDLE)))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(highlight_buttons);
        schedule.run(&mut world);

        let background = world.get::<BackgroundColor>(button).map(|color| color.0);
        assert_eq!(background, Some(BUTTON_HOVERED), "hover color not applied");
    }
}
