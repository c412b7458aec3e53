use serde::Serialize;

use super::domain::CoursePreference;

/// Most preferences an applicant may rank.
pub const MAX_PREFERENCES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Course {
    pub code: &'static str,
    pub name: &'static str,
}

const STANDARD_COURSES: [Course; 5] = [
    Course {
        code: "01",
        name: "Physics, Chemistry, Biology & Maths",
    },
    Course {
        code: "11",
        name: "History, Economics, Poli. Sci & Sociology",
    },
    Course {
        code: "35",
        name: "Journalism, Eng. Lit., Commun. English & Psychology",
    },
    Course {
        code: "37",
        name: "Busi. Studies, Accountancy, Economics & Statistics",
    },
    Course {
        code: "39",
        name: "Busi. Studies, Accountancy, Economics & Computer Application",
    },
];

/// Fixed in-memory course catalog used to resolve preference codes.
#[derive(Debug, Clone, Copy)]
pub struct CourseCatalog {
    courses: &'static [Course],
}

impl Default for CourseCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl CourseCatalog {
    pub const fn standard() -> Self {
        Self {
            courses: &STANDARD_COURSES,
        }
    }

    pub fn courses(&self) -> &'static [Course] {
        self.courses
    }

    pub fn find(&self, code: &str) -> Option<&'static Course> {
        let code = code.trim();
        self.courses.iter().find(|course| course.code == code)
    }

    pub fn preference(&self, rank: u8, code: &str) -> Option<CoursePreference> {
        self.find(code).map(|course| CoursePreference {
            preference: rank,
            code: course.code.to_string(),
            name: course.name.to_string(),
        })
    }
}
