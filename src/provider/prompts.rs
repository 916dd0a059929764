//! Prompt templates for the assistant convenience routes.

pub fn evaluate_assignment(assignment: &str, criteria: &str) -> String {
    format!(
        "Please evaluate the following assignment based on these criteria:\n\
         {criteria}\n\
         \n\
         Assignment:\n\
         {assignment}\n\
         \n\
         Provide a detailed evaluation including:\n\
         1. Overall score (out of 100)\n\
         2. Strengths\n\
         3. Areas for improvement\n\
         4. Specific feedback on content, structure, and accuracy"
    )
}

pub fn learning_material(subject: &str, topic: &str, difficulty: &str, learning_style: &str) -> String {
    format!(
        "Create learning material for:\n\
         Subject: {subject}\n\
         Topic: {topic}\n\
         Difficulty: {difficulty}\n\
         Learning Style: {learning_style}\n\
         \n\
         Include:\n\
         1. A clear explanation of the concept\n\
         2. Examples that illustrate the concept\n\
         3. Practice exercises with varying difficulty\n\
         4. Visual aids or diagrams if appropriate"
    )
}

pub fn enhance_notes(notes: &str) -> String {
    format!(
        "Enhance the following study notes:\n\
         {notes}\n\
         \n\
         Please provide:\n\
         1. A concise summary of the main points\n\
         2. A list of key concepts and their definitions\n\
         3. Related concepts or additional information that might be helpful\n\
         4. 5-10 review questions based on the content"
    )
}

pub fn language_practice(language: &str, level: &str, user_message: &str) -> String {
    format!(
        "You are a language tutor for {language} at {level} level.\n\
         \n\
         The student says: \"{user_message}\"\n\
         \n\
         Please:\n\
         1. Respond naturally to continue the conversation\n\
         2. Correct any grammar or vocabulary mistakes\n\
         3. Suggest alternative phrases or expressions if appropriate\n\
         4. Keep your response encouraging and helpful"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_prompt_interpolates_both_inputs() {
        let prompt = evaluate_assignment("my essay text", "clarity and accuracy");

        assert!(prompt.starts_with("Please evaluate the following assignment"));
        assert!(prompt.contains("clarity and accuracy"));
        assert!(prompt.contains("Assignment:\nmy essay text"));
        assert!(prompt.contains("Overall score (out of 100)"));
    }

    #[test]
    fn material_prompt_lists_all_four_parameters() {
        let prompt = learning_material("Math", "Fractions", "beginner", "visual");

        assert!(prompt.contains("Subject: Math"));
        assert!(prompt.contains("Topic: Fractions"));
        assert!(prompt.contains("Difficulty: beginner"));
        assert!(prompt.contains("Learning Style: visual"));
    }

    #[test]
    fn notes_prompt_asks_for_review_questions() {
        let prompt = enhance_notes("photosynthesis converts light to energy");

        assert!(prompt.starts_with("Enhance the following study notes:"));
        assert!(prompt.contains("photosynthesis converts light to energy"));
        assert!(prompt.contains("5-10 review questions"));
    }

    #[test]
    fn practice_prompt_frames_the_tutor_persona() {
        let prompt = language_practice("Spanish", "intermediate", "Hola, como estas?");

        assert!(prompt.starts_with("You are a language tutor for Spanish at intermediate level."));
        assert!(prompt.contains("The student says: \"Hola, como estas?\""));
        assert!(prompt.contains("encouraging and helpful"));
    }
}
