// Skill extraction prompt templates.

pub const SKILL_EXTRACTION_SYSTEM: &str = "\
You are a precise skill extractor for resumes and job descriptions. \
You only report skills that appear in the provided skills list, using their canonical names. \
You MUST respond with a valid JSON array only, no markdown fences, no explanations.";

pub const SKILL_EXTRACTION_PROMPT: &str = r#"Extract all technical and soft skills from the text below, mapping synonyms to the canonical names in this skills list:
{taxonomy}

Output only a JSON array of objects with "name" and "category" keys, for example:
[
  {"name": "Python", "category": "programming_languages"},
  {"name": "Critical Thinking", "category": "soft_skills"}
]
Use canonical names for synonyms (e.g. "Python3" or "Py" becomes "Python").
If no skills are found, return [].

TEXT:
{text}"#;
