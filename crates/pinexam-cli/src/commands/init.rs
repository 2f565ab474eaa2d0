//! The `pinexam init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create pinexam.toml
    if std::path::Path::new("pinexam.toml").exists() {
        println!("pinexam.toml already exists, skipping.");
    } else {
        std::fs::write("pinexam.toml", SAMPLE_CONFIG)?;
        println!("Created pinexam.toml");
    }

    // Create demo course
    std::fs::create_dir_all("courses/demo")?;
    let course_path = std::path::Path::new("courses/demo/en.json");
    if course_path.exists() {
        println!("courses/demo/en.json already exists, skipping.");
    } else {
        std::fs::write(course_path, DEMO_COURSE)?;
        println!("Created courses/demo/en.json");
    }

    println!("\nNext steps:");
    println!("  1. Run: pinexam validate --course courses");
    println!("  2. Run: pinexam start --course demo");
    println!("  3. Answer, then: pinexam update --pin <PIN> and pinexam lock --pin <PIN>");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# pinexam configuration

# "file" keeps journals and results on disk, "memory" forgets them on exit
store = "file"
data_dir = "./pinexam-data"
courses_dir = "./courses"
default_language = "en"
log_filter = "pinexam=info"
"#;

const DEMO_COURSE: &str = r#"{
  "title": "Demo course",
  "validationSchemaTemplate": "AA-[0-9][0-9]%2",
  "tests": [
    {
      "id": "colors",
      "category": "CHECKBOX",
      "task": "Which of these are colors?",
      "options": [
        { "text": "red", "correct": true },
        { "text": "table" },
        { "text": "blue", "correct": true }
      ]
    },
    {
      "id": "capital",
      "category": "RADIO_BUTTONS",
      "task": "What is the capital of France?",
      "options": [
        { "text": "Paris", "correct": true },
        { "text": "Lyon" }
      ]
    },
    {
      "id": "kingdoms",
      "category": "MULTIPLE_OPTIONS",
      "task": "Animal or plant?",
      "columns": ["animal", "plant"],
      "options": [
        { "text": "cat", "correct": "animal" },
        { "text": "oak", "correct": "plant" }
      ]
    },
    {
      "id": "colon",
      "category": "SPEED",
      "task": "Select the second colon",
      "seconds": 10,
      "options": [
        { "text": "ab:cd:ef", "correct": ":", "index": 1 }
      ]
    },
    {
      "id": "feedback",
      "category": "MULTIPLE_CHOICE",
      "task": "How did you like it?",
      "evaluated": false,
      "options": [
        { "text": "a lot" },
        { "text": "not much" }
      ]
    }
  ],
  "testgroups": [
    { "id": "warmup", "tests": ["colors", "capital"], "select": 1 }
  ],
  "sets": [
    {
      "id": "basics",
      "elements": ["warmup", "kingdoms", "colon", "feedback"],
      "evaluation": {
        "text": "Thanks for taking the demo course.",
        "thresholds": [
          { "score": 0, "text": "Keep practising." },
          { "score": 3, "text": "Well done!" }
        ]
      }
    }
  ],
  "infopages": [
    { "id": "welcome", "text": "Welcome to the demo course.", "belongs": ["basics"] }
  ]
}
"#;
