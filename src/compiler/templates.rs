//! Fixed program text
//!
//! Helper function bodies and the path-tracing `main`. Scene-specific
//! values enter through `${name}` slots filled by [`fill`].

use super::program::{Function, Signature, Statement};

/// Fill `${name}` slots. Unknown slots are left untouched.
pub fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut text = template.to_string();
    for (name, value) in slots {
        text = text.replace(&format!("${{{}}}", name), value);
    }
    text
}

/// Names of `${...}` slots still present in `text`
pub fn unfilled(text: &str) -> Vec<&str> {
    let mut slots = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                slots.push(&after[..end]);
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    slots
}

/// A helper function emitted ahead of `main`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    /// `vec2 random(float seed)`
    Random,
    /// `vec3 ortho(vec3 v)`
    Ortho,
    /// `vec3 calculateSample(vec3 normal, float smoothness, vec2 noise)`
    CalculateSample,
    /// `vec3 sampleSphere(vec2 noise)`
    SampleSphere,
    /// `float smin(float a, float b, float k)`
    SmoothMin,
    /// `float smax(float a, float b, float k)`
    SmoothMax,
    /// `float ellipsoid(vec3 p, vec3 r)`
    Ellipsoid,
}

impl Helper {
    /// Helpers every program carries
    pub const ALWAYS: [Helper; 4] = [
        Helper::Random,
        Helper::Ortho,
        Helper::CalculateSample,
        Helper::SampleSphere,
    ];

    /// Function definition
    pub fn function(self) -> Function {
        let (signature, body) = match self {
            Helper::Random => (
                Signature::new("vec2", "random", &[("float", "seed")]),
                RANDOM_BODY,
            ),
            Helper::Ortho => (Signature::new("vec3", "ortho", &[("vec3", "v")]), ORTHO_BODY),
            Helper::CalculateSample => (
                Signature::new(
                    "vec3",
                    "calculateSample",
                    &[("vec3", "normal"), ("float", "smoothness"), ("vec2", "noise")],
                ),
                CALCULATE_SAMPLE_BODY,
            ),
            Helper::SampleSphere => (
                Signature::new("vec3", "sampleSphere", &[("vec2", "noise")]),
                SAMPLE_SPHERE_BODY,
            ),
            Helper::SmoothMin => (
                Signature::new("float", "smin", &[("float", "a"), ("float", "b"), ("float", "k")]),
                SMIN_BODY,
            ),
            Helper::SmoothMax => (
                Signature::new("float", "smax", &[("float", "a"), ("float", "b"), ("float", "k")]),
                SMAX_BODY,
            ),
            Helper::Ellipsoid => (
                Signature::new("float", "ellipsoid", &[("vec3", "p"), ("vec3", "r")]),
                ELLIPSOID_BODY,
            ),
        };
        Function::new(signature, Statement::lines(body))
    }
}

const RANDOM_BODY: &str = "\
vec2 s = uv * (1.0 + time + seed);
return vec2(
    fract(sin(dot(s, vec2(12.9898, 78.233))) * 43758.5453),
    fract(cos(dot(s, vec2(4.898, 7.23))) * 23421.631));";

const ORTHO_BODY: &str = "\
return abs(v.x) > abs(v.z) ? vec3(-v.y, v.x, 0.0) : vec3(0.0, -v.z, v.y);";

const CALCULATE_SAMPLE_BODY: &str = "\
vec3 o1 = normalize(ortho(normal));
vec3 o2 = normalize(cross(normal, o1));
noise.x *= 2.0 * PI;
noise.y = sqrt(smoothness + (1.0 - smoothness) * noise.y);
float q = sqrt(1.0 - noise.y * noise.y);
return q * (cos(noise.x) * o1 + sin(noise.x) * o2) + noise.y * normal;";

const SAMPLE_SPHERE_BODY: &str = "\
noise.x *= 2.0 * PI;
noise.y = noise.y * 2.0 - 1.0;
float q = sqrt(1.0 - noise.y * noise.y);
return vec3(q * cos(noise.x), q * sin(noise.x), noise.y);";

const SMIN_BODY: &str = "\
k = max(k, 1e-6);
float h = max(k - abs(a - b), 0.0) / k;
return min(a, b) - h * h * k * 0.25;";

const SMAX_BODY: &str = "\
k = max(k, 1e-6);
float h = max(k - abs(a - b), 0.0) / k;
return max(a, b) + h * h * k * 0.25;";

const ELLIPSOID_BODY: &str = "\
float k0 = length(p / r);
float k1 = max(length(p / (r * r)), 1e-9);
return k0 * (k0 - 1.0) / k1;";

/// Body of `main`. Slots: `eye`, `target`, `up`, `field_of_view`, `aperture`.
pub const MAIN_BODY: &str = "\
vec3 eye = ${eye};
vec3 target = ${target};
vec3 up = ${up};
float fieldOfView = ${field_of_view};
float aperture = ${aperture};

vec3 look = normalize(target - eye);
up = normalize(up - dot(look, up) * look);
vec3 right = cross(look, up);

vec4 result = vec4(0.0);

for (int iteration = 0; iteration <= iterations; iteration++) {
    vec2 jitter = random(float(iteration));

    vec2 lens = jitter.x * aperture * vec2(cos(jitter.y * 2.0 * PI), sin(jitter.y * 2.0 * PI));
    vec3 from = eye + lens.x * right + lens.y * up;

    vec2 angle = (uv * 0.5 + (jitter - 0.5) / resolution) * fieldOfView;
    vec3 screen = vec3(cos(angle.y) * sin(angle.x), sin(angle.y), cos(angle.y) * cos(angle.x));
    vec3 to = eye + length(target - eye) * (right * screen.x + up * screen.y + look * screen.z);

    vec3 direction = normalize(to - from);

    vec3 luminance = vec3(1.0);
    Material air = materialAir(from, vec3(0.0), direction);
    Material current = air;

    for (int bounce = 1; bounce <= bounces; bounce++) {
        Closest closest = Closest(0, MAX_VALUE);
        vec3 position = from;
        float travelled = 0.0;

        vec2 noise = random(float(iteration * bounces + bounce));

        float limit = -log(noise.y) * current.scatter;

        for (int marched = 1; marched <= steps; marched++) {
            closest = calculateClosest(position);

            if (closest.distance < epsilon) {
                travelled += closest.distance;
                position = from + direction * travelled;
                break;
            }

            if (travelled > limit) {
                travelled = limit;
                position = from + direction * travelled;
                break;
            }

            travelled += closest.distance * 0.5;
            position = from + direction * travelled;
            travelled -= epsilon;
        }

        if (closest.object == 0)
            break;

        if (travelled == limit) {
            from = position;
            direction = sampleSphere(noise);
            result += vec4(luminance * current.emissivity, 1.0);
            luminance *= current.color;
            continue;
        }

        vec3 normal = calculateNormal(closest.object, position);
        Material material = calculateMaterial(closest.object, position, normal, direction);

        result += vec4(luminance * material.emissivity, 1.0);

        bool backface = dot(normal, direction) > 0.0;
        if (backface)
            normal = -normal;

        normal = calculateSample(normal, material.smoothness, noise);

        if (material.color == vec3(0.0))
            break;

        luminance *= material.color;

        if (noise.y < material.transmittance) {
            float eta = current.refraction / material.refraction;
            if (backface)
                eta = 1.0 / eta;

            vec3 refracted = refract(direction, normal, eta);
            if (refracted != vec3(0.0)) {
                from = position - 6.0 * epsilon * direction / dot(direction, normal);
                direction = refracted;
                current = material;
                if (backface)
                    current = air;
                continue;
            }
        }

        from = position + 2.0 * epsilon * normal;
        direction = reflect(direction, normal);
    }
}

vec4 original = texture2D(texture, uv * 0.5 + 0.5);

if (clicked)
    original *= 0.5;

gl_FragColor = original + result;";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_unfilled() {
        let text = fill("vec3 a = ${a}; float b = ${b};", &[("a", "vec3(1.0)")]);
        assert_eq!(text, "vec3 a = vec3(1.0); float b = ${b};");
        assert_eq!(unfilled(&text), vec!["b"]);
    }

    #[test]
    fn test_main_slots() {
        let mut slots = unfilled(MAIN_BODY);
        slots.sort_unstable();
        assert_eq!(slots, vec!["aperture", "eye", "field_of_view", "target", "up"]);
    }

    #[test]
    fn test_refraction_falls_back_to_reflection() {
        // The refract branch only runs when refract() did not signal total
        // internal reflection; otherwise control reaches reflect().
        let guard = MAIN_BODY.find("if (refracted != vec3(0.0))").unwrap();
        let reflect = MAIN_BODY.find("direction = reflect(direction, normal);").unwrap();
        assert!(guard < reflect);
    }

    #[test]
    fn test_helpers_render() {
        let f = Helper::Random.function();
        assert_eq!(f.name(), "random");
        assert_eq!(f.signature.to_string(), "vec2 random(float seed)");
    }
}
