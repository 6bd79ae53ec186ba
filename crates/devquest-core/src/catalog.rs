//! Built-in content tables: lessons, quiz questions, and adventure
//! stages. The rest of the crate treats these as read-only input keyed
//! by stable string IDs; swapping the tables out does not touch the
//! ledger rules.

use serde::Serialize;

use crate::ProgressRecord;

/// ID under which a finished quiz run is recorded in the progress
/// ledger.
pub const QUIZ_ID: &str = "javascript-quiz";

#[derive(Debug, Clone, Copy, Serialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Html,
    Css,
    Javascript,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Css => "css",
            Self::Javascript => "javascript",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "html" => Some(Self::Html),
            "css" => Some(Self::Css),
            "javascript" => Some(Self::Javascript),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Basic,
    Intermediate,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "basic" => Some(Self::Basic),
            "intermediate" => Some(Self::Intermediate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct Lesson {
    pub id: &'static str,
    pub title: &'static str,
    pub summary: &'static str,
    pub category: Category,
    pub difficulty: Difficulty,
    pub xp_reward: u64,
    pub code_example: &'static str,
    pub body: &'static str,
}

#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct QuizQuestion {
    pub id: &'static str,
    pub prompt: &'static str,
    pub options: [&'static str; 4],
    pub correct_index: usize,
    pub explanation: &'static str,
}

#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct Stage {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub xp_reward: u64,
    pub tasks: &'static [&'static str],
    pub code_template: &'static str,
}

#[must_use]
pub fn lessons() -> &'static [Lesson] {
    &LESSONS
}

#[must_use]
pub fn quiz_questions() -> &'static [QuizQuestion] {
    &QUIZ_QUESTIONS
}

#[must_use]
pub fn stages() -> &'static [Stage] {
    &STAGES
}

#[must_use]
pub fn lesson_by_id(id: &str) -> Option<&'static Lesson> {
    LESSONS.iter().find(|lesson| lesson.id == id)
}

#[must_use]
pub fn stage_by_id(id: &str) -> Option<&'static Stage> {
    STAGES.iter().find(|stage| stage.id == id)
}

#[must_use]
pub fn stage_index(id: &str) -> Option<usize> {
    STAGES.iter().position(|stage| stage.id == id)
}

/// A stage is unlocked when it is the first stage or its predecessor has
/// been completed.
#[must_use]
pub fn is_stage_unlocked(stages: &[Stage], index: usize, record: &ProgressRecord) -> bool {
    if index >= stages.len() {
        return false;
    }
    if index == 0 {
        return true;
    }

    let previous = stages[index - 1].id;
    record.completed_stages.iter().any(|id| id == previous)
}

const LESSONS: [Lesson; 6] = [
    Lesson {
        id: "html-basics",
        title: "HTML Fundamentals",
        summary: "Learn the basic structure of HTML documents",
        category: Category::Html,
        difficulty: Difficulty::Basic,
        xp_reward: 50,
        code_example: r"<!DOCTYPE html>
<html>
<head>
    <title>My First Page</title>
</head>
<body>
    <h1>Welcome to HTML!</h1>
    <p>This is a paragraph.</p>
</body>
</html>",
        body: "HTML (HyperText Markup Language) is the standard markup language for creating web pages. It describes the structure of a web page using elements and tags.",
    },
    Lesson {
        id: "html-forms",
        title: "HTML Forms",
        summary: "Create interactive forms with HTML",
        category: Category::Html,
        difficulty: Difficulty::Intermediate,
        xp_reward: 75,
        code_example: r#"<form>
    <label for="name">Name:</label>
    <input type="text" id="name" name="name" required>

    <label for="email">Email:</label>
    <input type="email" id="email" name="email" required>

    <button type="submit">Submit</button>
</form>"#,
        body: "HTML forms are used to collect user input. They contain form elements like input fields, checkboxes, radio buttons, and submit buttons.",
    },
    Lesson {
        id: "css-basics",
        title: "CSS Fundamentals",
        summary: "Style your web pages with CSS",
        category: Category::Css,
        difficulty: Difficulty::Basic,
        xp_reward: 60,
        code_example: r"h1 {
    color: #3B82F6;
    font-size: 2rem;
    text-align: center;
}

.container {
    max-width: 800px;
    margin: 0 auto;
    padding: 20px;
}",
        body: "CSS (Cascading Style Sheets) is used to style and layout web pages. It controls colors, fonts, spacing, and positioning of HTML elements.",
    },
    Lesson {
        id: "css-flexbox",
        title: "CSS Flexbox",
        summary: "Master flexible layouts with Flexbox",
        category: Category::Css,
        difficulty: Difficulty::Intermediate,
        xp_reward: 80,
        code_example: r".container {
    display: flex;
    justify-content: center;
    align-items: center;
    flex-wrap: wrap;
    gap: 20px;
}

.item {
    flex: 1;
    min-width: 200px;
}",
        body: "Flexbox is a powerful layout system that makes it easy to create responsive designs. It provides efficient ways to arrange, distribute, and align elements.",
    },
    Lesson {
        id: "js-basics",
        title: "JavaScript Fundamentals",
        summary: "Learn the basics of JavaScript programming",
        category: Category::Javascript,
        difficulty: Difficulty::Basic,
        xp_reward: 70,
        code_example: r#"// Variables
let name = "Alae";
const age = 25;
var isStudent = true;

// Functions
function greet(name) {
    return "Hello, " + name + "!";
}

console.log(greet("World"));"#,
        body: "JavaScript is a programming language that adds interactivity to web pages. It can manipulate HTML elements, respond to user events, and perform calculations.",
    },
    Lesson {
        id: "js-dom",
        title: "DOM Manipulation",
        summary: "Interact with web pages using JavaScript",
        category: Category::Javascript,
        difficulty: Difficulty::Intermediate,
        xp_reward: 90,
        code_example: r#"// Select elements
const button = document.getElementById('myButton');
const text = document.querySelector('.text');

// Add event listener
button.addEventListener('click', function() {
    text.textContent = 'Button clicked!';
    text.style.color = 'blue';
});"#,
        body: "The DOM (Document Object Model) allows JavaScript to interact with HTML elements. You can change content, styles, and respond to user interactions.",
    },
];

const QUIZ_QUESTIONS: [QuizQuestion; 12] = [
    QuizQuestion {
        id: "q1",
        prompt: "What is the correct way to declare a variable in JavaScript?",
        options: [
            "var myVar = 5;",
            "variable myVar = 5;",
            "v myVar = 5;",
            "declare myVar = 5;",
        ],
        correct_index: 0,
        explanation: "The \"var\" keyword is used to declare variables in JavaScript.",
    },
    QuizQuestion {
        id: "q2",
        prompt: "Which operator is used for strict equality in JavaScript?",
        options: ["=", "==", "===", "!="],
        correct_index: 2,
        explanation: "The \"===\" operator checks for strict equality (same value and type).",
    },
    QuizQuestion {
        id: "q3",
        prompt: "What does DOM stand for?",
        options: [
            "Document Object Model",
            "Data Object Management",
            "Dynamic Object Method",
            "Document Oriented Model",
        ],
        correct_index: 0,
        explanation: "DOM stands for Document Object Model, which represents the page structure.",
    },
    QuizQuestion {
        id: "q4",
        prompt: "Which method is used to add an event listener in JavaScript?",
        options: [
            "attachEvent()",
            "addEventListener()",
            "addEvent()",
            "listen()",
        ],
        correct_index: 1,
        explanation: "addEventListener() is the standard method to add event listeners.",
    },
    QuizQuestion {
        id: "q5",
        prompt: "What is the result of \"3\" + 2 in JavaScript?",
        options: ["5", "32", "Error", "undefined"],
        correct_index: 1,
        explanation:
            "JavaScript concatenates the string \"3\" with the number 2, resulting in \"32\".",
    },
    QuizQuestion {
        id: "q6",
        prompt: "Which loop is best for iterating over arrays?",
        options: ["for loop", "while loop", "do-while loop", "all of the above"],
        correct_index: 3,
        explanation: "All loop types can iterate over arrays, but each has different use cases.",
    },
    QuizQuestion {
        id: "q7",
        prompt: "What is the purpose of the \"return\" statement in a function?",
        options: [
            "To stop the function",
            "To output a value",
            "To restart the function",
            "To declare a variable",
        ],
        correct_index: 1,
        explanation:
            "The \"return\" statement outputs a value from a function and stops execution.",
    },
    QuizQuestion {
        id: "q8",
        prompt: "Which method is used to find an element by its ID?",
        options: [
            "getElementsById()",
            "getElementById()",
            "findById()",
            "selectById()",
        ],
        correct_index: 1,
        explanation: "getElementById() is the method to find an element by its ID attribute.",
    },
    QuizQuestion {
        id: "q9",
        prompt: "What is the difference between \"let\" and \"var\"?",
        options: [
            "No difference",
            "let has block scope",
            "var has block scope",
            "let is older",
        ],
        correct_index: 1,
        explanation: "let has block scope, while var has function scope.",
    },
    QuizQuestion {
        id: "q10",
        prompt: "Which event is fired when a page finishes loading?",
        options: ["onready", "onload", "onstart", "onfinish"],
        correct_index: 1,
        explanation: "The \"onload\" event is fired when a page finishes loading.",
    },
    QuizQuestion {
        id: "q11",
        prompt: "What is the correct syntax for an if statement?",
        options: ["if i = 5 then", "if (i == 5)", "if i == 5", "if (i = 5)"],
        correct_index: 1,
        explanation: "The correct syntax is if (condition) with parentheses around the condition.",
    },
    QuizQuestion {
        id: "q12",
        prompt: "Which method adds an element to the end of an array?",
        options: ["add()", "append()", "push()", "insert()"],
        correct_index: 2,
        explanation: "The push() method adds elements to the end of an array.",
    },
];

const STAGES: [Stage; 5] = [
    Stage {
        id: "stage1",
        title: "HTML & Git Basics",
        description: "Learn HTML structure and version control with Git",
        xp_reward: 100,
        tasks: &[
            "Create a basic HTML document",
            "Add headings and paragraphs",
            "Initialize a Git repository",
            "Make your first commit",
        ],
        code_template: r"<!DOCTYPE html>
<html>
<head>
    <title>My First Page</title>
</head>
<body>
    <!-- Add your content here -->
</body>
</html>",
    },
    Stage {
        id: "stage2",
        title: "CSS & Flexbox Styling",
        description: "Style your webpage with CSS and master Flexbox layouts",
        xp_reward: 150,
        tasks: &[
            "Add CSS styles to your HTML",
            "Create a flexbox layout",
            "Add colors and typography",
            "Make it responsive",
        ],
        code_template: r"/* Add your CSS styles here */
.container {
    display: flex;
    /* Add flexbox properties */
}

.item {
    /* Style your items */
}",
    },
    Stage {
        id: "stage3",
        title: "JavaScript ToDo App",
        description: "Build a dynamic ToDo application with JavaScript",
        xp_reward: 200,
        tasks: &[
            "Create HTML structure for ToDo app",
            "Add JavaScript functionality",
            "Implement add/remove tasks",
            "Add local storage",
        ],
        code_template: r"// ToDo App JavaScript
const todos = [];

function addTodo(text) {
    // Implement add functionality
}

function removeTodo(index) {
    // Implement remove functionality
}

// Add more functions here",
    },
    Stage {
        id: "stage4",
        title: "React & Tailwind Refactor",
        description: "Convert your ToDo app to React with Tailwind CSS",
        xp_reward: 250,
        tasks: &[
            "Set up React components",
            "Add Tailwind CSS styling",
            "Implement state management",
            "Add component interactions",
        ],
        code_template: r#"import React, { useState } from 'react';

function TodoApp() {
    const [todos, setTodos] = useState([]);

    // Implement your React component

    return (
        <div className="container mx-auto p-4">
            {/* Add your JSX here */}
        </div>
    );
}"#,
    },
    Stage {
        id: "stage5",
        title: "Deploy Personal Portfolio",
        description: "Create and deploy your personal portfolio website",
        xp_reward: 300,
        tasks: &[
            "Design portfolio layout",
            "Add your projects",
            "Optimize for performance",
            "Deploy to production",
        ],
        code_template: r"// Portfolio Template
import React from 'react';

function Portfolio() {
    return (
        <div>
            <header>
                <h1>Your Name</h1>
                <p>Your Title</p>
            </header>
            <main>
                {/* Add your portfolio content */}
            </main>
        </div>
    );
}",
    },
];
