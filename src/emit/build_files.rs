// src/emit/build_files.rs
//
// Build descriptors dropped next to the generated tree: a CMake file
// produced by placeholder substitution over a fixed template, plus the
// shell scripts that configure and build it (and the collector it links
// against). Assemblies with an entry point become executables, the rest
// static libraries that referencing assemblies link.

const CMAKE_TEMPLATE: &str = r#"cmake_minimum_required (VERSION 3.10 FATAL_ERROR)

project (<%name%>)

file (GLOB_RECURSE <%name%>_SRC "src/*.cpp" "impl/*.cpp")

include_directories ("src" "impl" "../bdwgc/include"<%include%>)
link_directories ("../bdwgc/out"<%links%>)

set (CMAKE_CXX_FLAGS "${CMAKE_CXX_FLAGS} -std=c++14 -fpermissive -Wno-invalid-offsetof")

add_<%type%> (<%name%> ${<%name%>_SRC})

target_link_libraries (<%name%><%libraries%>)
"#;

const BUILD_SCRIPT_TEMPLATE: &str = r#"#!/bin/sh
mkdir -p build_<%config_lower%>
cd build_<%config_lower%>
cmake -DCMAKE_BUILD_TYPE=<%config%> ..
make
"#;

const PREREQUISITES_SCRIPT: &str = r#"#!/bin/sh
cd ../bdwgc
mkdir -p out
cd out
cmake -DENABLE_MULTITHREADED=ON -DENABLE_PARALLEL_MARK=ON -DENABLE_THREAD_LOCAL_ALLOC=ON ..
make gcmt-lib
"#;

pub struct BuildPlan<'a> {
    pub assembly: &'a str,
    pub is_executable: bool,
    pub references: &'a [String],
}

fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("<%{key}%>"), value);
    }
    out
}

/// Renders every build file for one assembly as (file name, content)
/// pairs, rooted at the assembly's output directory.
pub fn write_build_files(plan: &BuildPlan) -> Vec<(String, String)> {
    let include: String = plan
        .references
        .iter()
        .map(|r| format!(" \"../{r}/src\""))
        .collect();
    let links: String = plan
        .references
        .iter()
        .map(|r| format!(" \"../{r}/build_release\" \"../{r}/build_debug\""))
        .collect();
    let mut libraries: String = plan.references.iter().map(|r| format!(" {r}")).collect();
    libraries.push_str(" gcmt-lib stdc++");

    let cmake = fill(
        CMAKE_TEMPLATE,
        &[
            ("name", plan.assembly.to_string()),
            (
                "type",
                if plan.is_executable {
                    "executable".to_string()
                } else {
                    "library".to_string()
                },
            ),
            ("include", include),
            ("links", links),
            ("libraries", libraries),
        ],
    );

    let mut files = vec![("CMakeLists.txt".to_string(), cmake)];
    for config in ["Debug", "Release"] {
        let script = fill(
            BUILD_SCRIPT_TEMPLATE,
            &[
                ("config", config.to_string()),
                ("config_lower", config.to_lowercase()),
            ],
        );
        files.push((format!("build_{}.sh", config.to_lowercase()), script));
    }
    files.push((
        "build_prerequisites.sh".to_string(),
        PREREQUISITES_SCRIPT.to_string(),
    ));
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executable_descriptor_fills_every_placeholder() {
        let references = vec!["CoreLib".to_string()];
        let files = write_build_files(&BuildPlan {
            assembly: "Demo",
            is_executable: true,
            references: &references,
        });
        let cmake = &files.iter().find(|(n, _)| n == "CMakeLists.txt").unwrap().1;
        assert!(!cmake.contains("<%"));
        assert!(cmake.contains("project (Demo)"));
        assert!(cmake.contains("add_executable (Demo ${Demo_SRC})"));
        assert!(cmake.contains("target_link_libraries (Demo CoreLib gcmt-lib stdc++)"));
        assert!(cmake.contains("\"../CoreLib/src\""));
    }

    #[test]
    fn library_descriptor_and_scripts() {
        let files = write_build_files(&BuildPlan {
            assembly: "CoreLib",
            is_executable: false,
            references: &[],
        });
        let cmake = &files.iter().find(|(n, _)| n == "CMakeLists.txt").unwrap().1;
        assert!(cmake.contains("add_library (CoreLib ${CoreLib_SRC})"));
        let debug = &files.iter().find(|(n, _)| n == "build_debug.sh").unwrap().1;
        assert!(debug.starts_with("#!/bin/sh\n"));
        assert!(debug.contains("cmake -DCMAKE_BUILD_TYPE=Debug .."));
        let release = &files.iter().find(|(n, _)| n == "build_release.sh").unwrap().1;
        assert!(release.contains("-DCMAKE_BUILD_TYPE=Release"));
        assert!(files.iter().any(|(n, _)| n == "build_prerequisites.sh"));
    }
}
