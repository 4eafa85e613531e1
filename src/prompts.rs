use std::collections::HashMap;

use crate::component::Framework;

const GENERATION_TEMPLATE: &str = "\
You are an experienced programmer with expertise in web development and UI/UX design. You create modern, animated, and fully responsive UI components. You are highly skilled in HTML, CSS, Tailwind CSS, Bootstrap, JavaScript, React, Next.js, Vue.js, Angular, and more.

Now, generate a UI component for: {{description}}
Framework to use: {{framework}}

Requirements:
- The code must be clean, well-structured, and easy to understand.
- Optimize for SEO where applicable.
- Focus on creating a modern, animated, and responsive UI design.
- Include high-quality hover effects, shadows, animations, colors, and typography.
- Return ONLY the code, formatted properly in **Markdown fenced code blocks**.
- Do NOT include explanations, text, comments, or anything else besides the code.
- And give the whole code in a single HTML file.
";

const SUGGESTION_TEMPLATE: &str = "\
You are a UI/UX expert. A user wants to create: \"{{description}}\"

Enhance this prompt by adding 3-4 key details that will help generate better code:
- What style/theme? (modern, minimal, glassmorphic, etc.)
- Any specific colors or design preferences?
- Key interactions (hover effects, animations)?
- Any special features needed?

Keep it concise - maximum 2-3 sentences. Make it natural and conversational.

Example input: \"pricing card\"
Example output: \"Create a modern pricing card with 3 tiers (Basic, Pro, Premium). Use purple gradient accents, smooth hover animations, and make it fully responsive. Include feature lists and call-to-action buttons for each tier.\"

Return ONLY the enhanced prompt, nothing else.
";

/// Substitute `{{key}}` placeholders in one pass, so substituted values are
/// never expanded again. Unknown placeholders are left intact.
pub fn render_prompt(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let known = after
            .find("}}")
            .and_then(|end| vars.get(&after[..end]).map(|value| (end, *value)));
        match known {
            Some((end, value)) => {
                result.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                result.push_str("{{");
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}

/// Instruction asking the model for a single-file component.
pub fn build_generation_prompt(description: &str, framework: Framework) -> String {
    let vars = HashMap::from([("description", description), ("framework", framework.id())]);
    render_prompt(GENERATION_TEMPLATE, &vars)
}

/// Instruction asking the model to enrich a short description.
pub fn build_suggestion_prompt(description: &str) -> String {
    let vars = HashMap::from([("description", description)]);
    render_prompt(SUGGESTION_TEMPLATE, &vars)
}
