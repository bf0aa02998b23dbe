//! Prompt and narration text construction.

use storymill_db::models::character::Character;

/// Build the story-generation prompt from the full character list and the
/// chosen scene description.
pub fn build_story_prompt(characters: &[Character], scene: &str) -> String {
    let names = characters
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(" and ");

    format!(
        "Write a title and a rhyming story on {} main characters called {}.\n\
         The story needs to be set within the scene {} and be at least 200 words long",
        characters.len(),
        names,
        scene,
    )
}

/// Text handed to the speech synthesizer for a story.
pub fn narration_text(title: &str, description: &str) -> String {
    format!("This is a story called {title}. {description}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(name: &str) -> Character {
        Character {
            id: name.to_lowercase(),
            name: name.to_string(),
            description: None,
        }
    }

    #[test]
    fn prompt_names_all_characters_and_the_scene() {
        let prompt = build_story_prompt(
            &[character("Ana"), character("Leo")],
            "a quiet forest",
        );
        assert!(prompt.contains("2 main characters called Ana and Leo"));
        assert!(prompt.contains("within the scene a quiet forest"));
    }

    #[test]
    fn single_character_has_no_joiner() {
        let prompt = build_story_prompt(&[character("Ana")], "a castle");
        assert!(prompt.contains("1 main characters called Ana."));
    }

    #[test]
    fn narration_leads_with_the_title() {
        let text = narration_text("The Quiet Forest", "Once upon a time...");
        assert_eq!(
            text,
            "This is a story called The Quiet Forest. Once upon a time..."
        );
    }
}
